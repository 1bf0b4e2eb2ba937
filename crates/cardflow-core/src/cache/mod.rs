//! On-disk artifacts that let a run skip the board service.
//!
//! Three fixed files live in the cache directory:
//!
//! | file | content |
//! |------|---------|
//! | `cards.csv` | one [`ItemRecord`](crate::snapshot::ItemRecord) per row (`bucket,name,id`) |
//! | `counts.csv` | `date` column then one column per bucket; blank cell = absent |
//! | `.start` | the [`Watermark`] in canonical instant form |
//!
//! Items and counts are only overwritten when the [`WritePolicy`] allows
//! it. The watermark is always written.

mod store;

pub use store::CacheStore;

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Earliest event timestamp of the last full historical pull.
pub type Watermark = NaiveDateTime;

pub const ITEMS_FILE: &str = "cards.csv";
pub const COUNTS_FILE: &str = "counts.csv";
pub const WATERMARK_FILE: &str = ".start";

/// Whether a save may replace an existing artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Only write when the artifact does not exist yet.
    #[default]
    IfMissing,
    /// Always overwrite.
    Always,
}

impl WritePolicy {
    /// `Always` when `force` is set, otherwise `self`.
    #[must_use]
    pub const fn forced(self, force: bool) -> Self {
        if force { Self::Always } else { self }
    }
}

/// What a save actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Written,
    /// An artifact already existed and the policy kept it.
    Skipped,
}

/// Errors from reading or writing cache artifacts.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{} row {line}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{} does not hold a valid instant: '{raw}'", path.display())]
    InvalidWatermark { path: PathBuf, raw: String },
}

impl CacheError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::CacheReadFailed,
            Self::Write { .. } => ErrorCode::CacheWriteFailed,
            Self::Csv { .. } | Self::InvalidRow { .. } | Self::InvalidWatermark { .. } => {
                ErrorCode::CacheCorrupt
            }
        }
    }
}
