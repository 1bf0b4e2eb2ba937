//! Dense per-day count matrix over a date range.

use chrono::NaiveDateTime;

use crate::event::Event;
use crate::timeseries::counter::count_buckets;
use crate::timeseries::frame::EventFrame;
use crate::timeseries::range::DateRange;
use crate::timeseries::{CountMatrix, DailyCountRow};

/// Count bucket residency for every day from `start` to `end` (default now).
///
/// # Panics
///
/// Panics if the matrix does not have exactly one row per instant of the
/// range. That would be a defect in the range or counter, not bad input.
#[must_use]
pub fn assemble(
    events: &[Event],
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> CountMatrix {
    let frame = EventFrame::from_events(events);
    assemble_frame(&frame, &DateRange::new(start, end))
}

/// Same as [`assemble`] over a prebuilt frame and range.
///
/// # Panics
///
/// Panics if the row count differs from `range.len()`.
#[must_use]
pub fn assemble_frame(frame: &EventFrame, range: &DateRange) -> CountMatrix {
    let expected = range.len();
    tracing::debug!(
        events = frame.len(),
        days = expected,
        start = %range.start(),
        end = %range.end(),
        "assembling count matrix"
    );

    let rows: Vec<DailyCountRow> = range
        .iter()
        .map(|date| DailyCountRow {
            date,
            counts: count_buckets(frame, Some(date)),
        })
        .collect();

    assert_eq!(
        rows.len(),
        expected,
        "count matrix has {} rows for a {}-day range",
        rows.len(),
        expected
    );

    CountMatrix::from_sorted_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventCategory;
    use chrono::{Duration, NaiveDate};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 3, d)
            .and_then(|date| date.and_hms_opt(8, 30, 0))
            .expect("valid instant")
    }

    fn ev(item: u64, bucket: &str, ts: NaiveDateTime) -> Event {
        Event {
            id: format!("{item}-{ts}"),
            board: "B".into(),
            destination: Some(bucket.into()),
            source: None,
            item_short_id: Some(item),
            item_name: None,
            closed: false,
            timestamp: ts,
            category: EventCategory::CreateCard,
            actor: "a".into(),
        }
    }

    #[test]
    fn empty_history_yields_all_empty_rows() {
        let matrix = assemble(&[], day(1), Some(day(4)));
        assert_eq!(matrix.len(), 4);
        assert!(matrix.rows().iter().all(|row| row.counts.is_empty()));
        assert!(matrix.columns().is_empty());
    }

    #[test]
    fn rows_follow_range_dates() {
        let events = vec![ev(2, "Done", day(3)), ev(1, "Todo", day(2))];
        let matrix = assemble(&events, day(1), Some(day(4)));
        let dates: Vec<_> = matrix.rows().iter().map(|row| row.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(4)]);

        assert_eq!(matrix.count(0, "Todo"), 0);
        assert_eq!(matrix.count(1, "Todo"), 1);
        assert_eq!(matrix.count(2, "Done"), 1);
        assert_eq!(matrix.count(3, "Todo"), 1);
        assert_eq!(matrix.columns(), vec!["Done".to_string(), "Todo".to_string()]);
    }

    #[test]
    fn single_day_range() {
        let matrix = assemble(&[ev(1, "Todo", day(1))], day(1), Some(day(1)));
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.count(0, "Todo"), 1);
    }

    #[test]
    fn open_ended_range_runs_to_now() {
        let start = crate::instant::now() - Duration::days(5);
        let matrix = assemble(&[], start, None);
        assert!(matrix.len() >= 6);
    }
}
