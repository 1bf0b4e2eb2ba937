//! Instant parsing and formatting shared by events, ranges and the cache.
//!
//! All instants are UTC wall-clock times truncated to whole seconds and
//! carried as [`NaiveDateTime`]. The text form is [`INSTANT_FORMAT`].

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use crate::INSTANT_FORMAT;

/// Current UTC time truncated to whole seconds.
#[must_use]
pub fn now() -> NaiveDateTime {
    truncate(Utc::now().naive_utc())
}

/// Render an instant in the canonical `YYYY-MM-DD HH:MM:SS` form.
#[must_use]
pub fn format(instant: NaiveDateTime) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// Parse either an RFC 3339 timestamp (as sent by the board service, e.g.
/// `2018-09-01T12:34:56.789Z`) or the canonical cache form.
///
/// Offsets are converted to UTC. Sub-second precision is dropped.
#[must_use]
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(truncate(dt.with_timezone(&Utc).naive_utc()));
    }
    NaiveDateTime::parse_from_str(trimmed, INSTANT_FORMAT)
        .ok()
        .map(truncate)
}

fn truncate(instant: NaiveDateTime) -> NaiveDateTime {
    instant.with_nanosecond(0).unwrap_or(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid instant")
    }

    #[test]
    fn parses_service_timestamps_to_utc_seconds() {
        assert_eq!(
            parse("2018-09-01T12:34:56.789Z"),
            Some(at(2018, 9, 1, 12, 34, 56))
        );
        assert_eq!(
            parse("2018-09-01T14:34:56+02:00"),
            Some(at(2018, 9, 1, 12, 34, 56))
        );
    }

    #[test]
    fn parses_canonical_form() {
        assert_eq!(parse("2018-09-01 00:00:05"), Some(at(2018, 9, 1, 0, 0, 5)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn format_parse_agree() {
        let instant = at(2019, 1, 31, 23, 59, 59);
        assert_eq!(format(instant), "2019-01-31 23:59:59");
        assert_eq!(parse(&format(instant)), Some(instant));
    }
}
