use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use cardflow_core::snapshot::Snapshot;
use cardflow_core::timeseries::CountMatrix;
use plotters::prelude::*;

use super::palette::{Colormap, Palette};
use super::{ChartRenderer, series_columns, tick_label, tick_rows};

const FONT: &str = "sans-serif";

/// Writes charts as SVG files.
#[derive(Debug, Clone, Copy)]
pub struct SvgChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 900,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
const fn to_f64(v: usize) -> f64 {
    v as f64
}

/// Headroom above the largest bar, at least one unit.
fn axis_end(largest: usize) -> f64 {
    to_f64(largest + largest / 20).max(1.0)
}

/// Label for the category whose segment center is `value`; the trailing
/// dummy segment and unlabelled slots stay blank.
fn segment_label(value: &SegmentValue<usize>, labels: &[Option<String>]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().flatten().unwrap_or_default(),
        _ => String::new(),
    }
}

/// One segment per category: `Exact(i)..Exact(i + 1)`.
const fn segment(i: usize) -> (SegmentValue<usize>, SegmentValue<usize>) {
    (SegmentValue::Exact(i), SegmentValue::Exact(i + 1))
}

impl ChartRenderer for SvgChartRenderer {
    fn render_snapshot(
        &self,
        snapshot: &Snapshot,
        title: &str,
        path: &Path,
    ) -> anyhow::Result<PathBuf> {
        let palette = Palette::parse(&snapshot.colors, Colormap::Jet)?;
        let rows = &snapshot.rows;
        let colors = palette.colors(rows.len());
        let labels: Vec<Option<String>> = rows.iter().map(|row| Some(row.bucket.clone())).collect();
        let slots = rows.len().max(1);

        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 32))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(180)
            .build_cartesian_2d(0f64..axis_end(snapshot.longest()), (0..slots).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(slots + 1)
            .y_label_formatter(&|y: &SegmentValue<usize>| segment_label(y, &labels))
            .x_label_formatter(&|x: &f64| format!("{x:.0}"))
            .x_desc("count")
            .y_desc("Trello List")
            .label_style((FONT, 16))
            .draw()?;

        chart.draw_series(rows.iter().zip(&colors).enumerate().map(|(i, (row, color))| {
            let (low, high) = segment(i);
            let mut bar = Rectangle::new([(0.0, low), (to_f64(row.count), high)], color.filled());
            bar.set_margin(4, 4, 0, 0);
            bar
        }))?;

        root.present()
            .with_context(|| format!("failed to write chart {}", path.display()))?;
        tracing::info!(path = %path.display(), bars = rows.len(), "rendered snapshot chart");
        Ok(path.to_path_buf())
    }

    fn render_time_series(
        &self,
        matrix: &CountMatrix,
        selected: &[String],
        palette: &Palette,
        title: &str,
        path: &Path,
    ) -> anyhow::Result<PathBuf> {
        let columns = series_columns(matrix, selected);
        if columns.is_empty() {
            bail!("none of the requested lists have counts to chart");
        }
        let view = matrix.select(&columns);
        let days = view.len();
        let colors = palette.colors(columns.len());
        let ticks = tick_rows(days);
        let labels: Vec<Option<String>> = view
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| ticks.contains(&i).then(|| tick_label(row.date)))
            .collect();
        let slots = days.max(1);

        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 32))
            .margin(20)
            .x_label_area_size(110)
            .y_label_area_size(60)
            .build_cartesian_2d((0..slots).into_segmented(), 0f64..axis_end(view.max_total()))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slots + 1)
            .x_label_formatter(&|x: &SegmentValue<usize>| segment_label(x, &labels))
            .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
            .y_label_formatter(&|y: &f64| format!("{y:.0}"))
            .y_desc("count")
            .label_style((FONT, 16))
            .draw()?;

        let mut baseline = vec![0.0f64; days];
        for (name, &color) in columns.iter().zip(&colors) {
            let mut bars = Vec::with_capacity(days);
            for (day, base) in baseline.iter_mut().enumerate() {
                let height = to_f64(view.count(day, name));
                if height > 0.0 {
                    let (low, high) = segment(day);
                    let mut bar = Rectangle::new([(low, *base), (high, *base + height)], color.filled());
                    bar.set_margin(0, 0, 1, 1);
                    bars.push(bar);
                }
                *base += height;
            }
            chart
                .draw_series(bars)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 16))
            .draw()?;

        root.present()
            .with_context(|| format!("failed to write chart {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            days,
            lists = columns.len(),
            "rendered time series chart"
        );
        Ok(path.to_path_buf())
    }
}
