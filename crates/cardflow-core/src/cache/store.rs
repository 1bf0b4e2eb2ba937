use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{
    COUNTS_FILE, CacheError, ITEMS_FILE, SaveOutcome, WATERMARK_FILE, Watermark, WritePolicy,
};
use crate::instant;
use crate::snapshot::ItemRecord;
use crate::timeseries::{CountMatrix, DailyCountRow};

const DATE_COLUMN: &str = "date";

/// Cache artifacts rooted at one directory.
///
/// Missing files load as empty (or `None`); malformed files are errors.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn items_path(&self) -> PathBuf {
        self.dir.join(ITEMS_FILE)
    }

    #[must_use]
    pub fn counts_path(&self) -> PathBuf {
        self.dir.join(COUNTS_FILE)
    }

    #[must_use]
    pub fn watermark_path(&self) -> PathBuf {
        self.dir.join(WATERMARK_FILE)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Load cached items; empty when `cards.csv` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Csv`] if the file cannot be decoded.
    pub fn load_items(&self) -> Result<Vec<ItemRecord>, CacheError> {
        let path = self.items_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path).map_err(|source| CacheError::Csv {
            path: path.clone(),
            source,
        })?;
        let items = reader
            .deserialize::<ItemRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CacheError::Csv {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), items = items.len(), "loaded cached items");
        Ok(items)
    }

    /// Save items unless the policy keeps an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or file cannot be written.
    pub fn save_items(
        &self,
        items: &[ItemRecord],
        policy: WritePolicy,
    ) -> Result<SaveOutcome, CacheError> {
        let path = self.items_path();
        if !self.may_write(&path, policy) {
            return Ok(SaveOutcome::Skipped);
        }
        self.ensure_dir()?;

        let mut writer = csv::Writer::from_path(&path).map_err(|source| CacheError::Csv {
            path: path.clone(),
            source,
        })?;
        if items.is_empty() {
            writer
                .write_record(["bucket", "name", "id"])
                .map_err(|source| CacheError::Csv {
                    path: path.clone(),
                    source,
                })?;
        }
        for item in items {
            writer.serialize(item).map_err(|source| CacheError::Csv {
                path: path.clone(),
                source,
            })?;
        }
        writer.flush().map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), items = items.len(), "saved items");
        Ok(SaveOutcome::Written)
    }

    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    /// Load the cached count matrix; empty when `counts.csv` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Csv`] for undecodable CSV and
    /// [`CacheError::InvalidRow`] for bad dates, bad counts, or rows out of
    /// date order.
    pub fn load_counts(&self) -> Result<CountMatrix, CacheError> {
        let path = self.counts_path();
        if !path.exists() {
            return Ok(CountMatrix::default());
        }
        let csv_err = |source| CacheError::Csv {
            path: path.clone(),
            source,
        };
        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        let headers = reader.headers().map_err(csv_err)?.clone();
        let buckets: Vec<&str> = headers.iter().skip(1).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map_or(0, csv::Position::line);
            let invalid = |reason: String| CacheError::InvalidRow {
                path: path.clone(),
                line,
                reason,
            };

            let raw_date = record.get(0).unwrap_or_default();
            let date = instant::parse(raw_date)
                .ok_or_else(|| invalid(format!("invalid date '{raw_date}'")))?;

            let mut counts = BTreeMap::new();
            for (bucket, cell) in buckets.iter().zip(record.iter().skip(1)) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let count = parse_count(cell)
                    .ok_or_else(|| invalid(format!("invalid count '{cell}' for '{bucket}'")))?;
                counts.insert((*bucket).to_string(), count);
            }
            rows.push(DailyCountRow { date, counts });
        }

        let matrix = CountMatrix::from_rows(rows).map_err(|err| CacheError::InvalidRow {
            path: path.clone(),
            line: 0,
            reason: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), rows = matrix.len(), "loaded cached counts");
        Ok(matrix)
    }

    /// Save the count matrix unless the policy keeps an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or file cannot be written.
    pub fn save_counts(
        &self,
        matrix: &CountMatrix,
        policy: WritePolicy,
    ) -> Result<SaveOutcome, CacheError> {
        let path = self.counts_path();
        if !self.may_write(&path, policy) {
            return Ok(SaveOutcome::Skipped);
        }
        self.ensure_dir()?;

        let csv_err = |source| CacheError::Csv {
            path: path.clone(),
            source,
        };
        let columns = matrix.columns();
        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(DATE_COLUMN.to_string());
        header.extend(columns.iter().cloned());
        writer.write_record(&header).map_err(csv_err)?;

        for row in matrix.rows() {
            let mut record = Vec::with_capacity(header.len());
            record.push(instant::format(row.date));
            record.extend(
                columns
                    .iter()
                    .map(|bucket| row.counts.get(bucket).map(ToString::to_string).unwrap_or_default()),
            );
            writer.write_record(&record).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            rows = matrix.len(),
            buckets = columns.len(),
            "saved counts"
        );
        Ok(SaveOutcome::Written)
    }

    // -----------------------------------------------------------------------
    // Watermark
    // -----------------------------------------------------------------------

    /// Load the watermark; `None` when `.start` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Read`] on I/O failure and
    /// [`CacheError::InvalidWatermark`] if the content is not an instant.
    pub fn load_watermark(&self) -> Result<Option<Watermark>, CacheError> {
        let path = self.watermark_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|source| CacheError::Read {
            path: path.clone(),
            source,
        })?;
        instant::parse(&raw)
            .map(Some)
            .ok_or_else(|| CacheError::InvalidWatermark {
                path,
                raw: raw.trim().to_string(),
            })
    }

    /// Write the watermark, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] if the file cannot be written.
    pub fn save_watermark(&self, watermark: Watermark) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let path = self.watermark_path();
        fs::write(&path, instant::format(watermark)).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), %watermark, "saved watermark");
        Ok(())
    }

    /// Save counts and the watermark of the same pull. The watermark is
    /// only written when the counts are, so `.start` always describes the
    /// matrix in `counts.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] or [`CacheError::Csv`] on failure.
    pub fn save_series(
        &self,
        matrix: &CountMatrix,
        watermark: Watermark,
        policy: WritePolicy,
    ) -> Result<SaveOutcome, CacheError> {
        let outcome = self.save_counts(matrix, policy)?;
        if outcome == SaveOutcome::Written {
            self.save_watermark(watermark)?;
        }
        Ok(outcome)
    }

    fn may_write(&self, path: &Path, policy: WritePolicy) -> bool {
        match policy {
            WritePolicy::Always => true,
            WritePolicy::IfMissing if path.exists() => {
                tracing::info!(
                    path = %path.display(),
                    dir = %self.dir.display(),
                    "cache file exists, not overwriting (use --force)"
                );
                false
            }
            WritePolicy::IfMissing => true,
        }
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Write {
            path: self.dir.clone(),
            source,
        })
    }
}

/// Whole counts, also accepting float cells such as `3.0`.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(cell: &str) -> Option<usize> {
    if let Ok(count) = cell.parse::<usize>() {
        return Some(count);
    }
    let value = cell.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX.into() {
        return Some(value as usize);
    }
    None
}
