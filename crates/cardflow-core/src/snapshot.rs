//! Current item distribution per bucket.
//!
//! Unlike the time series there is no history here: every [`ItemRecord`]
//! counts once in the bucket it currently sits in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One item on the board, tagged with the bucket that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub bucket: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

/// Group-count items by bucket.
#[must_use]
pub fn count_by_bucket(items: &[ItemRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.bucket.clone()).or_insert(0) += 1;
    }
    counts
}

/// One bar of the snapshot chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub bucket: String,
    pub count: usize,
}

/// Bucket counts arranged for display, with their paired colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub rows: Vec<SnapshotRow>,
    pub colors: Vec<String>,
    /// Colors were supplied but their count differs from the row count.
    pub color_mismatch: bool,
}

impl Snapshot {
    /// Arrange counts for display.
    ///
    /// Buckets named in `order` come first, in that order (names with no
    /// count are skipped); the rest follow alphabetically. With `reverse`,
    /// rows and colors are both reversed so each color stays with the
    /// same bucket position from the other end. A non-empty `colors` list
    /// whose length differs from the number of rows is logged and flagged,
    /// never rejected.
    #[must_use]
    pub fn arrange(
        counts: &BTreeMap<String, usize>,
        order: &[String],
        colors: &[String],
        reverse: bool,
    ) -> Self {
        let mut rows: Vec<SnapshotRow> = Vec::with_capacity(counts.len());
        for name in order {
            if rows.iter().any(|row| &row.bucket == name) {
                continue;
            }
            if let Some(&count) = counts.get(name) {
                rows.push(SnapshotRow {
                    bucket: name.clone(),
                    count,
                });
            }
        }
        for (name, &count) in counts {
            if !order.contains(name) {
                rows.push(SnapshotRow {
                    bucket: name.clone(),
                    count,
                });
            }
        }

        let mut colors = colors.to_vec();
        if reverse {
            rows.reverse();
            colors.reverse();
        }

        let color_mismatch = !colors.is_empty() && colors.len() != rows.len();
        if color_mismatch {
            tracing::warn!(
                colors = colors.len(),
                rows = rows.len(),
                "mismatch between number of colors and number of rows in graph"
            );
        }

        Self {
            rows,
            colors,
            color_mismatch,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    /// Largest single bucket count.
    #[must_use]
    pub fn longest(&self) -> usize {
        self.rows.iter().map(|row| row.count).max().unwrap_or(0)
    }
}
