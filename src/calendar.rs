// 📅 Calendar helpers - month labels and record date parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{InsightsError, InsightsResult};

/// Three-letter month labels, calendar order
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Full month names, calendar order
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a stored date column into a calendar date.
///
/// Accepts plain dates, naive datetimes and RFC 3339 timestamps (the time
/// part is dropped). Anything else is a transformation error, never a
/// silently defaulted date.
pub fn parse_record_date(raw: &str) -> InsightsResult<NaiveDate> {
    let value = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    Err(InsightsError::Transformation(format!(
        "unparseable date '{}'",
        raw
    )))
}

/// 0-based slot for a 1-based month number
pub fn month_slot(month: u32) -> InsightsResult<usize> {
    if (1..=12).contains(&month) {
        Ok(month as usize - 1)
    } else {
        Err(InsightsError::Transformation(format!(
            "month {} outside 1..=12",
            month
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 2, 14).unwrap();

        assert_eq!(parse_record_date("2023-02-14").unwrap(), expected);
        assert_eq!(parse_record_date("02/14/2023").unwrap(), expected);
        assert_eq!(parse_record_date("2023-02-14 08:30:00").unwrap(), expected);
        assert_eq!(parse_record_date("2023-02-14T08:30:00").unwrap(), expected);
        assert_eq!(parse_record_date("2023-02-14T08:30:00+05:30").unwrap(), expected);
        assert_eq!(parse_record_date(" 2023-02-14 ").unwrap(), expected);
    }

    #[test]
    fn test_unparseable_date_is_surfaced() {
        let err = parse_record_date("14th of Feb").unwrap_err();
        assert!(matches!(err, InsightsError::Transformation(_)));
    }

    #[test]
    fn test_month_slot_bounds() {
        assert_eq!(month_slot(1).unwrap(), 0);
        assert_eq!(month_slot(12).unwrap(), 11);
        assert!(month_slot(0).is_err());
        assert!(month_slot(13).is_err());
    }
}
