//! Time-series bucket counts.
//!
//! - [`range`] — gapless daily instants ([`DateRange`]).
//! - [`frame`] — columnar event history with interned columns.
//! - [`counter`] — bucket residency at one instant.
//! - [`assemble`](mod@assemble) — one counter run per day of a range.
//!
//! The result is a [`CountMatrix`]: one [`DailyCountRow`] per day, dates
//! strictly ascending. A bucket absent from a row counts as zero.

pub mod assemble;
pub mod counter;
pub mod frame;
pub mod range;

pub use assemble::{assemble, assemble_frame};
pub use counter::{count_buckets, count_buckets_in};
pub use frame::{EventFrame, Interner, Symbol};
pub use range::{DateRange, DateRangeIter, day_key};

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

/// Bucket counts for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCountRow {
    pub date: NaiveDateTime,
    pub counts: BTreeMap<String, usize>,
}

impl DailyCountRow {
    #[must_use]
    pub const fn new(date: NaiveDateTime) -> Self {
        Self {
            date,
            counts: BTreeMap::new(),
        }
    }

    /// Count for `bucket`, zero when absent.
    #[must_use]
    pub fn count(&self, bucket: &str) -> usize {
        self.counts.get(bucket).copied().unwrap_or(0)
    }
}

/// Rows that would break the one-row-per-date ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("row {index} date {date} is not after the previous row")]
    NotAscending { index: usize, date: NaiveDateTime },
}

/// Date-ordered sequence of [`DailyCountRow`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountMatrix {
    rows: Vec<DailyCountRow>,
}

impl CountMatrix {
    /// Build a matrix, checking dates are strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NotAscending`] at the first out-of-order or
    /// duplicate date.
    pub fn from_rows(rows: Vec<DailyCountRow>) -> Result<Self, MatrixError> {
        for (index, pair) in rows.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(MatrixError::NotAscending {
                    index: index + 1,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { rows })
    }

    pub(crate) const fn from_sorted_rows(rows: Vec<DailyCountRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[DailyCountRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|row| row.date)
    }

    /// Sorted union of bucket names seen in any row.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.counts.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Count at `row` for `bucket`, zero when the bucket is absent.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn count(&self, row: usize, bucket: &str) -> usize {
        self.rows[row].count(bucket)
    }

    /// Restrict every row to `buckets`; an empty selection keeps all.
    #[must_use]
    pub fn select(&self, buckets: &[String]) -> Self {
        if buckets.is_empty() {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .map(|row| DailyCountRow {
                date: row.date,
                counts: row
                    .counts
                    .iter()
                    .filter(|(name, _)| buckets.contains(*name))
                    .map(|(name, count)| (name.clone(), *count))
                    .collect(),
            })
            .collect();
        Self { rows }
    }

    /// Largest per-day total across the selected buckets.
    #[must_use]
    pub fn max_total(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.counts.values().sum::<usize>())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 2, 28)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid")
    }

    fn row(offset: i64, counts: &[(&str, usize)]) -> DailyCountRow {
        DailyCountRow {
            date: start() + Duration::days(offset),
            counts: counts.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
        }
    }

    #[test]
    fn from_rows_rejects_duplicates_and_disorder() {
        let dup = CountMatrix::from_rows(vec![row(0, &[]), row(0, &[])]);
        assert!(matches!(dup, Err(MatrixError::NotAscending { index: 1, .. })));

        let backwards = CountMatrix::from_rows(vec![row(0, &[]), row(2, &[]), row(1, &[])]);
        assert!(matches!(backwards, Err(MatrixError::NotAscending { index: 2, .. })));
    }

    #[test]
    fn absent_bucket_reads_as_zero() {
        let matrix = CountMatrix::from_rows(vec![row(0, &[("Todo", 3)]), row(1, &[("Done", 1)])])
            .expect("ordered");
        assert_eq!(matrix.count(0, "Done"), 0);
        assert_eq!(matrix.count(1, "Done"), 1);
        assert_eq!(matrix.columns(), vec!["Done".to_string(), "Todo".to_string()]);
        assert_eq!(matrix.first_date(), Some(start()));
    }

    #[test]
    fn select_projects_columns() {
        let matrix = CountMatrix::from_rows(vec![
            row(0, &[("Todo", 3), ("Done", 1)]),
            row(1, &[("Todo", 2), ("Done", 4), ("Doing", 1)]),
        ])
        .expect("ordered");

        let picked = matrix.select(&["Done".to_string()]);
        assert_eq!(picked.columns(), vec!["Done".to_string()]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.max_total(), 4);

        assert_eq!(matrix.select(&[]), matrix);
        assert_eq!(matrix.max_total(), 7);
    }
}
