//! Gapless daily instants between a start and an end.

use chrono::{Duration, NaiveDateTime};

use crate::instant;

const SECONDS_PER_DAY: i64 = 86_400;

/// A daily sequence `start, start + 1d, ...` that continues while the last
/// emitted instant is still before `end`.
///
/// The first element is always `start`, so a degenerate range
/// (`start >= end`, e.g. from clock skew) yields exactly one instant. The
/// range is `Copy`; every call to [`DateRange::iter`] restarts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Build a range; `end` defaults to the current UTC instant.
    #[must_use]
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>) -> Self {
        Self {
            start,
            end: end.unwrap_or_else(instant::now),
        }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Number of instants the range yields.
    #[must_use]
    pub fn len(&self) -> usize {
        remaining(Some(self.start), self.end)
    }

    /// Never true: a range always yields at least `start`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub const fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDateTime;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &DateRange {
    type Item = NaiveDateTime;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateRangeIter {
    next: Option<NaiveDateTime>,
    end: NaiveDateTime,
}

impl Iterator for DateRangeIter {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.end {
            current.checked_add_signed(Duration::days(1))
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = remaining(self.next, self.end);
        (n, Some(n))
    }
}

impl ExactSizeIterator for DateRangeIter {}

fn remaining(next: Option<NaiveDateTime>, end: NaiveDateTime) -> usize {
    let Some(next) = next else {
        return 0;
    };
    if next >= end {
        return 1;
    }
    let gap = (end - next).num_seconds();
    let days = (gap + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    usize::try_from(days).map_or(usize::MAX, |d| d.saturating_add(1))
}

/// Canonical key for one day of the range.
#[must_use]
pub fn day_key(day: NaiveDateTime) -> String {
    instant::format(day)
}
