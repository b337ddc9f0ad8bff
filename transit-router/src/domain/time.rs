//! Schedule time handling.
//!
//! Timetables express times as seconds since local midnight of the service
//! day. GTFS-style "HH:MM:SS" strings may carry hours of 24 and above for
//! runs that continue past midnight, so a schedule time is not a time of day.
//! This module converts between those strings, raw seconds, and calendar
//! date-times.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Seconds in one service day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse "HH:MM:SS" or "HH:MM" into seconds since midnight.
///
/// Hours may exceed 23 (up to 99) for after-midnight running.
///
/// # Examples
///
/// ```
/// use transit_router::domain::parse_hhmmss;
///
/// assert_eq!(parse_hhmmss("08:10:00").unwrap(), 29_400);
/// assert_eq!(parse_hhmmss("08:10").unwrap(), 29_400);
/// assert_eq!(parse_hhmmss("25:00:00").unwrap(), 90_000);
///
/// assert!(parse_hhmmss("8:10").is_err());
/// assert!(parse_hhmmss("08:60:00").is_err());
/// ```
pub fn parse_hhmmss(s: &str) -> Result<u32, TimeError> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 && bytes.len() != 8 {
        return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
    }
    if bytes[2] != b':' {
        return Err(TimeError::new("expected colon at position 2"));
    }

    let hour =
        parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
    let minute =
        parse_two_digits(&bytes[3..5]).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    let second = if bytes.len() == 8 {
        if bytes[5] != b':' {
            return Err(TimeError::new("expected colon at position 5"));
        }
        let second = parse_two_digits(&bytes[6..8])
            .ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        second
    } else {
        0
    };

    Ok(hour * 3600 + minute * 60 + second)
}

/// Format seconds since midnight as "HH:MM:SS".
///
/// Negative values are formatted with a leading minus sign; hours are not
/// wrapped at 24.
pub fn format_hhmmss(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

/// Returns the date-time `seconds` after midnight of `date`.
pub fn datetime_at(date: NaiveDate, seconds: i64) -> Option<NaiveDateTime> {
    NaiveDateTime::new(date, NaiveTime::MIN).checked_add_signed(Duration::seconds(seconds))
}

/// Returns the seconds of `instant` since midnight of its own date.
pub fn seconds_of_day(instant: NaiveDateTime) -> i64 {
    i64::from(instant.time().num_seconds_from_midnight())
}

/// Returns `date` shifted by `days` (which may be negative).
pub fn shift_date(date: NaiveDate, days: i32) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(i64::from(days)))
}

fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(u32::from(a - b'0') * 10 + u32::from(b - b'0'))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn parse_valid() {
        assert_eq!(parse_hhmmss("00:00:00").unwrap(), 0);
        assert_eq!(parse_hhmmss("07:30").unwrap(), 27_000);
        assert_eq!(parse_hhmmss("23:59:59").unwrap(), 86_399);
        assert_eq!(parse_hhmmss("24:00:00").unwrap(), 86_400);
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_hhmmss("").is_err());
        assert!(parse_hhmmss("0730").is_err());
        assert!(parse_hhmmss("07-30").is_err());
        assert!(parse_hhmmss("07:30-00").is_err());
        assert!(parse_hhmmss("07:3a").is_err());
        assert!(parse_hhmmss("07:30:60").is_err());
    }

    #[test]
    fn error_display() {
        let err = parse_hhmmss("07:61").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: minute must be 0-59");
    }

    #[test]
    fn format() {
        assert_eq!(format_hhmmss(0), "00:00:00");
        assert_eq!(format_hhmmss(29_400), "08:10:00");
        assert_eq!(format_hhmmss(90_061), "25:01:01");
        assert_eq!(format_hhmmss(-60), "-00:01:00");
    }

    #[test]
    fn datetime_crosses_midnight() {
        let dt = datetime_at(date(), 90_000).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(seconds_of_day(dt), 3_600);
    }

    #[test]
    fn shift_date_both_ways() {
        assert_eq!(
            shift_date(date(), -1),
            NaiveDate::from_ymd_opt(2024, 3, 14)
        );
        assert_eq!(shift_date(date(), 2), NaiveDate::from_ymd_opt(2024, 3, 17));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Formatting then parsing gives back the same number of seconds.
        #[test]
        fn format_then_parse(seconds in 0u32..(100 * 3600)) {
            let text = format_hhmmss(i64::from(seconds));
            prop_assert_eq!(parse_hhmmss(&text).unwrap(), seconds);
        }
    }
}
