//! Chart rendering for snapshot and time-series counts.
//!
//! [`ChartRenderer`] is the seam; [`SvgChartRenderer`] draws with plotters.
//! Titles, default file names and tick placement live here so they can be
//! tested without touching a drawing backend.

pub mod palette;
pub mod svg;

pub use palette::{Colormap, Palette};
pub use svg::SvgChartRenderer;

use std::path::{Path, PathBuf};

use cardflow_core::snapshot::Snapshot;
use cardflow_core::timeseries::CountMatrix;
use chrono::{NaiveDate, NaiveDateTime};

/// Up to this many rows, every bar gets a date label.
pub const DETAILED_ROW_LIMIT: usize = 50;

/// Above [`DETAILED_ROW_LIMIT`], one bar in this many is labelled.
pub const SPARSE_TICK_EVERY: usize = 12;

pub trait ChartRenderer {
    /// Horizontal bars, one per snapshot row. Returns the written path.
    ///
    /// # Errors
    ///
    /// Fails if the colors are invalid or the file cannot be written.
    fn render_snapshot(
        &self,
        snapshot: &Snapshot,
        title: &str,
        path: &Path,
    ) -> anyhow::Result<PathBuf>;

    /// Stacked vertical bars, one per day, one segment per selected bucket.
    /// An empty `selected` draws every bucket. Returns the written path.
    ///
    /// # Errors
    ///
    /// Fails if no selected bucket exists or the file cannot be written.
    fn render_time_series(
        &self,
        matrix: &CountMatrix,
        selected: &[String],
        palette: &Palette,
        title: &str,
        path: &Path,
    ) -> anyhow::Result<PathBuf>;
}

pub fn snapshot_title(board: &str, today: NaiveDate) -> String {
    format!("Current {} distribution {today}", camel_case(board))
}

pub fn time_series_title(board: &str, rows: usize, today: NaiveDate) -> String {
    let board = camel_case(board);
    if rows > DETAILED_ROW_LIMIT {
        format!("{board} Board time series {today}")
    } else {
        format!("{board} time series {today}")
    }
}

/// Title-case each word, then drop whitespace: `"team roadmap"` becomes
/// `"TeamRoadmap"`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        if c.is_whitespace() {
            after_letter = false;
            continue;
        }
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

pub fn default_snapshot_path(board: &str, today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("{}Snapshot_{today}.svg", camel_case(board)))
}

pub fn default_time_series_path(board: &str, today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("{}TimeSeries_{today}.svg", camel_case(board)))
}

/// Row indices that carry a date label.
pub fn tick_rows(rows: usize) -> Vec<usize> {
    let step = if rows > DETAILED_ROW_LIMIT {
        SPARSE_TICK_EVERY
    } else {
        1
    };
    (0..rows).step_by(step).collect()
}

pub fn tick_label(date: NaiveDateTime) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Buckets to draw: `selected` in the order given, or every column when
/// empty. Names with no column are logged and dropped.
pub fn series_columns(matrix: &CountMatrix, selected: &[String]) -> Vec<String> {
    let columns = matrix.columns();
    if selected.is_empty() {
        return columns;
    }
    let mut picked = Vec::with_capacity(selected.len());
    for name in selected {
        if picked.contains(name) {
            continue;
        }
        if columns.contains(name) {
            picked.push(name.clone());
        } else {
            tracing::warn!(list = %name, "no counts for list, leaving it out of the chart");
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_core::timeseries::DailyCountRow;
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 7).expect("valid")
    }

    #[test]
    fn camel_case_title_cases_then_strips_spaces() {
        assert_eq!(camel_case("team roadmap"), "TeamRoadmap");
        assert_eq!(camel_case("SPRINT board 2"), "SprintBoard2");
        assert_eq!(camel_case("o'neil's  list"), "O'Neil'SList");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn default_paths_embed_board_and_date() {
        assert_eq!(
            default_snapshot_path("team roadmap", today()),
            PathBuf::from("TeamRoadmapSnapshot_2019-03-07.svg")
        );
        assert_eq!(
            default_time_series_path("Ops", today()),
            PathBuf::from("OpsTimeSeries_2019-03-07.svg")
        );
    }

    #[test]
    fn titles_switch_on_row_count() {
        assert_eq!(
            snapshot_title("Ops", today()),
            "Current Ops distribution 2019-03-07"
        );
        assert_eq!(time_series_title("Ops", 50, today()), "Ops time series 2019-03-07");
        assert_eq!(
            time_series_title("Ops", 51, today()),
            "Ops Board time series 2019-03-07"
        );
    }

    #[test]
    fn titles_use_camel_cased_board() {
        assert_eq!(
            snapshot_title("team roadmap", today()),
            "Current TeamRoadmap distribution 2019-03-07"
        );
        assert_eq!(
            time_series_title("team roadmap", 3, today()),
            "TeamRoadmap time series 2019-03-07"
        );
    }

    #[test]
    fn ticks_every_row_until_limit_then_sparse() {
        assert_eq!(tick_rows(3), vec![0, 1, 2]);
        assert_eq!(tick_rows(50).len(), 50);
        assert_eq!(tick_rows(51), vec![0, 12, 24, 36, 48]);
        assert!(tick_rows(0).is_empty());
    }

    #[test]
    fn tick_label_is_day_month_year() {
        let date = today().and_hms_opt(10, 30, 0).expect("valid");
        assert_eq!(tick_label(date), "07-03-2019");
    }

    #[test]
    fn series_columns_keep_requested_order() {
        let date = today().and_hms_opt(0, 0, 0).expect("valid");
        let matrix = CountMatrix::from_rows(vec![DailyCountRow {
            date,
            counts: BTreeMap::from([("Done".to_string(), 1), ("Todo".to_string(), 2)]),
        }])
        .expect("ordered");
        assert_eq!(series_columns(&matrix, &[]), ["Done", "Todo"]);
        let selected = vec!["Todo".to_string(), "Missing".into(), "Done".into(), "Todo".into()];
        assert_eq!(series_columns(&matrix, &selected), ["Todo", "Done"]);
    }
}
