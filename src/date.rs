//! Date-range validation and Julian day conversion.
//!
//! ARGO profiles store their observation time (`juld`) as a number of days since
//! 1950-01-01T00:00:00Z. Date filters coming from the query string are validated here and
//! reduced to that day offset.
use crate::ArgoError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// 1950-01-01T00:00:00Z in milliseconds since the Unix epoch.
pub const JULIAN_EPOCH_MS: i64 = -631_152_000_000;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A validated date bound: the string as supplied and the instant it denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBound {
    pub raw: String,
    pub instant: DateTime<Utc>,
}

impl DateBound {
    pub fn parse(raw: &str) -> Result<Self, ArgoError> {
        Ok(DateBound {
            raw: raw.to_string(),
            instant: parse_date(raw)?,
        })
    }

    /// RFC 3339 rendering used when filtering on the raw `date_creation` column.
    pub fn iso_string(&self) -> String {
        self.instant.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Inclusive date range; each side is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateBound>,
    pub end: Option<DateBound>,
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|t| t.and_utc())
}

/// Parse a date string in any of the formats accepted for filtering.
///
/// Accepted: `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339, and `YYYY-MM-DDTHH:MM:SS[.fff]` or
/// `YYYY-MM-DD HH:MM:SS[.fff]` interpreted as UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, ArgoError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = midnight_utc(date) {
                return Ok(dt);
            }
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    Err(ArgoError::InvalidDateRange(format!(
        "invalid date format: {}",
        s
    )))
}

/// Validate an optional start/end pair.
///
/// Fails when either side is not a calendar date, or when both are present and the start is
/// after the end. Equal bounds are accepted.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DateRange, ArgoError> {
    let start = start.map(DateBound::parse).transpose()?;
    let end = end.map(DateBound::parse).transpose()?;

    if let (Some(s), Some(e)) = (&start, &end) {
        if s.instant > e.instant {
            return Err(ArgoError::InvalidDateRange(format!(
                "start date {} is after end date {}",
                s.raw, e.raw
            )));
        }
    }

    Ok(DateRange { start, end })
}

/// Day offset of an instant relative to 1950-01-01T00:00:00Z, floored.
pub fn datetime_to_julian_day(dt: &DateTime<Utc>) -> i64 {
    (dt.timestamp_millis() - JULIAN_EPOCH_MS).div_euclid(MS_PER_DAY)
}

/// Reduce a date string to its Julian day offset.
///
/// Only `YYYY-MM-DD` and RFC 3339 strings are reduced; other formats that [parse_date] accepts
/// return an error so that callers can fall back to filtering on the raw timestamp.
pub fn date_string_to_julian_day(s: &str) -> Result<i64, ArgoError> {
    let s = s.trim();
    let instant = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => midnight_utc(date),
        Err(_) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    };
    match instant {
        Some(dt) => Ok(datetime_to_julian_day(&dt)),
        None => Err(ArgoError::InvalidInput(format!(
            "cannot reduce {} to a Julian day",
            s
        ))),
    }
}

/// Convert a (possibly fractional) Julian day offset back to a UTC timestamp.
pub fn julian_day_to_datetime(juld: f64) -> Option<DateTime<Utc>> {
    if !juld.is_finite() {
        return None;
    }
    let ms = JULIAN_EPOCH_MS as f64 + juld * MS_PER_DAY as f64;
    DateTime::from_timestamp_millis(ms.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_constant() {
        let epoch = NaiveDate::from_ymd_opt(1950, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(epoch.timestamp_millis(), JULIAN_EPOCH_MS);
        assert_eq!(datetime_to_julian_day(&epoch), 0);
    }

    #[test]
    fn test_julian_day_conversion() {
        assert_eq!(date_string_to_julian_day("1950-01-02").unwrap(), 1);
        assert_eq!(date_string_to_julian_day("1949-12-31").unwrap(), -1);
        assert_eq!(date_string_to_julian_day("2024-01-01").unwrap(), 27028);
        assert_eq!(date_string_to_julian_day("2024-06-01").unwrap(), 27180);
        // time of day is floored away
        assert_eq!(
            date_string_to_julian_day("2024-01-01T23:59:59Z").unwrap(),
            27028
        );
        assert_eq!(
            date_string_to_julian_day("2024-01-01T01:00:00+02:00").unwrap(),
            27027
        );
    }

    #[test]
    fn test_julian_day_unreducible_format() {
        // accepted by the validator but not reducible to a day offset
        assert!(parse_date("2024/01/05").is_ok());
        assert!(parse_date("2024-01-05 10:00:00").is_ok());
        assert!(matches!(
            date_string_to_julian_day("2024/01/05"),
            Err(ArgoError::InvalidInput(_))
        ));
        assert!(date_string_to_julian_day("2024-01-05 10:00:00").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        assert!(matches!(
            validate_date_range(Some("2024-06-01"), Some("2024-01-01")),
            Err(ArgoError::InvalidDateRange(_))
        ));

        let range = validate_date_range(Some("2024-01-01"), Some("2024-06-01")).unwrap();
        assert_eq!(range.start.unwrap().raw, "2024-01-01");
        assert_eq!(range.end.unwrap().raw, "2024-06-01");

        assert!(validate_date_range(Some("2024-01-01"), Some("2024-01-01")).is_ok());
        assert!(validate_date_range(None, Some("2024-01-01")).is_ok());
        assert_eq!(validate_date_range(None, None).unwrap(), DateRange::default());
    }

    #[test]
    fn test_validate_malformed_dates() {
        assert!(matches!(
            validate_date_range(Some("yesterday"), None),
            Err(ArgoError::InvalidDateRange(_))
        ));
        assert!(validate_date_range(None, Some("2024-13-01")).is_err());
        assert!(validate_date_range(Some("2024-02-30"), None).is_err());
    }

    #[test]
    fn test_iso_string() {
        let bound = DateBound::parse("2024/01/05").unwrap();
        assert_eq!(bound.iso_string(), "2024-01-05T00:00:00.000Z");
    }

    #[test]
    fn test_julian_day_to_datetime() {
        let dt = julian_day_to_datetime(0.5).unwrap();
        assert_eq!(dt.to_rfc3339(), "1950-01-01T12:00:00+00:00");
        let dt = julian_day_to_datetime(27028.0).unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-01");
        assert!(julian_day_to_datetime(f64::NAN).is_none());
    }
}
