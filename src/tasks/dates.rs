//! Due-date parsing and display.
//!
//! Dates are entered as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`. A few close
//! variants are tolerated (seconds, a `T` separator, `/` between date
//! parts). A date without a time means the end of that day, 23:59:59.
//!
//! Display is the inverse: 23:59:59 is shown as a bare date. A due time the
//! user really entered as 23:59:59 is therefore shown the same way as a
//! date-only entry.

use crate::error::{Error, Result};
use crate::traits::Clock;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Formats carrying both a date and a time of day.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Formats carrying only a date.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Time of day assumed when only a date is given.
#[must_use]
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Parse date text into its date and, if present, its time of day.
fn parse_parts(raw: &str) -> Result<(NaiveDate, Option<NaiveTime>)> {
    let text = raw.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok((dt.date(), Some(dt.time())));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok((date, None));
        }
    }

    Err(Error::InvalidDateFormat(raw.to_string()))
}

/// Parse a due date.
///
/// With `enforce_future` set, the result must not be earlier than
/// `clock.now_local()`. The comparison uses the full date and time, so a
/// date-only entry for today is accepted until 23:59:59 while `today 08:00`
/// is rejected once 08:00 has passed.
///
/// # Errors
///
/// Returns [`Error::InvalidDateFormat`] for unparseable text and
/// [`Error::PastDate`] when enforcement rejects the instant.
pub fn parse_due_date(raw: &str, enforce_future: bool, clock: &impl Clock) -> Result<NaiveDateTime> {
    let (date, time) = parse_parts(raw)?;
    let due = date.and_time(time.unwrap_or_else(end_of_day));

    if enforce_future && due < clock.now_local() {
        return Err(Error::PastDate(due));
    }
    Ok(due)
}

/// Parse a date used as a filter bound. Past dates are accepted.
///
/// A bare date means the end of that day, as for due dates.
///
/// # Errors
///
/// Returns [`Error::InvalidDateFormat`] for unparseable text.
pub fn parse_filter_date(raw: &str) -> Result<NaiveDateTime> {
    let (date, time) = parse_parts(raw)?;
    Ok(date.and_time(time.unwrap_or_else(end_of_day)))
}

/// Parse a date used as the lower bound of a range. Past dates are accepted.
///
/// A bare date means the start of that day, so a range starting on a date
/// includes everything due on it.
///
/// # Errors
///
/// Returns [`Error::InvalidDateFormat`] for unparseable text.
pub fn parse_filter_start(raw: &str) -> Result<NaiveDateTime> {
    let (date, time) = parse_parts(raw)?;
    Ok(date.and_time(time.unwrap_or(NaiveTime::MIN)))
}

/// Render a due date: bare date for 23:59:59, date and `HH:MM` otherwise.
#[must_use]
pub fn format_due_date(due: NaiveDateTime) -> String {
    if due.time() == end_of_day() {
        due.format("%Y-%m-%d").to_string()
    } else {
        due.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Render a creation timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FixedClock;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    fn noon_june_15() -> FixedClock {
        FixedClock(dt(2024, 6, 15, 12, 0, 0))
    }

    #[test]
    fn test_date_only_is_end_of_day() {
        let due = parse_due_date("2024-01-01", false, &noon_june_15()).unwrap();
        assert_eq!(due, dt(2024, 1, 1, 23, 59, 59));
    }

    #[test]
    fn test_time_is_preserved() {
        let due = parse_due_date("2024-01-01 09:00", false, &noon_june_15()).unwrap();
        assert_eq!(due, dt(2024, 1, 1, 9, 0, 0));
    }

    #[test]
    fn test_tolerated_variants() {
        let clock = noon_june_15();
        assert_eq!(parse_due_date(" 2024-07-01 ", true, &clock).unwrap(), dt(2024, 7, 1, 23, 59, 59));
        assert_eq!(parse_due_date("2024-07-01 09:15:30", true, &clock).unwrap(), dt(2024, 7, 1, 9, 15, 30));
        assert_eq!(parse_due_date("2024-07-01T09:15", true, &clock).unwrap(), dt(2024, 7, 1, 9, 15, 0));
        assert_eq!(parse_due_date("2024/07/01", true, &clock).unwrap(), dt(2024, 7, 1, 23, 59, 59));
    }

    #[test]
    fn test_past_date_enforced() {
        let err = parse_due_date("2024-06-14", true, &noon_june_15()).unwrap_err();
        assert!(matches!(err, Error::PastDate(d) if d == dt(2024, 6, 14, 23, 59, 59)));
    }

    #[test]
    fn test_past_date_allowed_without_enforcement() {
        assert!(parse_due_date("2024-06-14", false, &noon_june_15()).is_ok());
    }

    #[test]
    fn test_enforcement_uses_time_of_day() {
        let clock = noon_june_15();
        assert!(matches!(
            parse_due_date("2024-06-15 11:59", true, &clock).unwrap_err(),
            Error::PastDate(_)
        ));
        assert!(parse_due_date("2024-06-15 12:00", true, &clock).is_ok());
        assert!(parse_due_date("2024-06-15", true, &clock).is_ok());
    }

    #[test]
    fn test_unparseable_text() {
        for raw in ["", "tomorrow", "2024-13-01", "2024-02-30", "01/02/2024", "2024-01-01 25:00"] {
            let err = parse_due_date(raw, false, &noon_june_15()).unwrap_err();
            assert!(matches!(err, Error::InvalidDateFormat(_)), "{raw}");
        }
    }

    #[test]
    fn test_format_errors_win_over_past_check() {
        let err = parse_due_date("1999-99-99", true, &noon_june_15()).unwrap_err();
        assert!(matches!(err, Error::InvalidDateFormat(_)));
    }

    #[test]
    fn test_filter_dates_accept_the_past() {
        assert_eq!(parse_filter_date("2001-02-03").unwrap(), dt(2001, 2, 3, 23, 59, 59));
        assert_eq!(parse_filter_start("2001-02-03").unwrap(), dt(2001, 2, 3, 0, 0, 0));
        assert_eq!(parse_filter_start("2001-02-03 10:30").unwrap(), dt(2001, 2, 3, 10, 30, 0));
        assert!(parse_filter_date("soon").is_err());
    }

    #[test]
    fn test_format_due_date() {
        assert_eq!(format_due_date(dt(2024, 1, 1, 23, 59, 59)), "2024-01-01");
        assert_eq!(format_due_date(dt(2024, 1, 1, 9, 5, 0)), "2024-01-01 09:05");
        assert_eq!(format_due_date(dt(2024, 1, 1, 23, 59, 0)), "2024-01-01 23:59");
    }

    #[test]
    fn test_explicit_end_of_day_collapses_to_date() {
        let due = parse_due_date("2024-07-01 23:59:59", false, &noon_june_15()).unwrap();
        assert_eq!(format_due_date(due), "2024-07-01");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = dt(2024, 6, 15, 8, 30, 5).and_utc();
        assert_eq!(format_timestamp(ts), "2024-06-15 08:30:05");
    }
}
