//! Bucket residency at a single instant.
//!
//! The event log is append-only; there is no per-item state table. The
//! counter reconstructs "which bucket is each item in as of `dt`" by
//! filtering the log and applying two dedup passes in sequence:
//!
//! 1. first qualifying row per item (input order);
//! 2. of those survivors, first row per exact timestamp.
//!
//! The board service lists actions newest first, so "first" is the most
//! recent action for an item. Rows without an item id share one key.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::event::Event;
use crate::instant;
use crate::timeseries::frame::{EventFrame, Symbol};

/// Count items per destination bucket as of `dt` (`None` means now).
///
/// Returns an empty map when nothing qualifies.
#[must_use]
pub fn count_buckets(frame: &EventFrame, dt: Option<NaiveDateTime>) -> BTreeMap<String, usize> {
    let dt = dt.unwrap_or_else(instant::now);

    let mut seen_items: HashSet<Option<u64>> = HashSet::new();
    let first_per_item: Vec<usize> = (0..frame.len())
        .filter(|&row| frame.is_bucket_relevant(row) && frame.timestamp(row) <= dt)
        .filter(|&row| seen_items.insert(frame.item(row)))
        .collect();

    let mut seen_timestamps: HashSet<NaiveDateTime> = HashSet::new();
    let mut by_symbol: HashMap<Symbol, usize> = HashMap::new();
    for row in first_per_item {
        if !seen_timestamps.insert(frame.timestamp(row)) {
            continue;
        }
        if frame.closed(row) {
            continue;
        }
        if let Some(bucket) = frame.destination(row) {
            *by_symbol.entry(bucket).or_default() += 1;
        }
    }

    by_symbol
        .into_iter()
        .map(|(symbol, count)| (frame.buckets().resolve(symbol).to_string(), count))
        .collect()
}

/// Convenience wrapper that builds a frame for a one-off count.
#[must_use]
pub fn count_buckets_in(events: &[Event], dt: Option<NaiveDateTime>) -> BTreeMap<String, usize> {
    count_buckets(&EventFrame::from_events(events), dt)
}
