//! Temporal parsing for STAC datetime parameters and item intervals.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed STAC `datetime` search parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatetimeSpec {
    /// A single instant.
    Instant(DateTime<Utc>),
    /// A closed or half-open interval. At least one bound is present.
    Interval {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl DatetimeSpec {
    /// The interval this spec covers, as inclusive optional bounds.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            DatetimeSpec::Instant(t) => (Some(*t), Some(*t)),
            DatetimeSpec::Interval { start, end } => (*start, *end),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid datetime format: {0}")]
    InvalidFormat(String),

    #[error("Empty datetime interval: both ends open")]
    EmptyInterval,

    #[error("Datetime interval start is after end: {0}")]
    InvertedInterval(String),
}

/// Parse a single instant.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (assumed UTC), or a bare
/// date (midnight UTC).
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Parse a STAC `datetime` parameter.
///
/// Supports:
/// - Single instant: `2023-05-01T00:00:00Z`
/// - Interval: `2023-01-01T00:00:00Z/2023-12-31T23:59:59Z`
/// - Open-ended interval: `../2023-12-31T23:59:59Z`, `2023-01-01T00:00:00Z/..`
///   (an empty string on either side is treated like `..`)
pub fn parse_datetime_param(s: &str) -> Result<DatetimeSpec, TimeParseError> {
    let s = s.trim();

    if let Some((start_raw, end_raw)) = s.split_once('/') {
        let parse_bound = |raw: &str| -> Result<Option<DateTime<Utc>>, TimeParseError> {
            let raw = raw.trim();
            if raw.is_empty() || raw == ".." {
                Ok(None)
            } else {
                parse_instant(raw).map(Some)
            }
        };

        let start = parse_bound(start_raw)?;
        let end = parse_bound(end_raw)?;

        if start.is_none() && end.is_none() {
            return Err(TimeParseError::EmptyInterval);
        }
        if let (Some(a), Some(b)) = (start, end) {
            if a > b {
                return Err(TimeParseError::InvertedInterval(s.to_string()));
            }
        }

        return Ok(DatetimeSpec::Interval { start, end });
    }

    parse_instant(s).map(DatetimeSpec::Instant)
}

/// The UTC interval spanned by a calendar year: Jan 1 00:00:00 through
/// Dec 31 23:59:59.
pub fn year_interval(year: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .expect("valid year start");
    let end = Utc
        .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
        .single()
        .expect("valid year end");
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant_forms() {
        let rfc = parse_instant("2023-05-01T12:30:00Z").unwrap();
        let naive = parse_instant("2023-05-01T12:30:00").unwrap();
        assert_eq!(rfc, naive);

        let date_only = parse_instant("2023-05-01").unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap());

        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_parse_interval() {
        let spec = parse_datetime_param("2023-01-01/2023-06-30").unwrap();
        let (start, end) = spec.bounds();
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(end, Some(Utc.with_ymd_and_hms(2023, 6, 30, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_open_ended() {
        let spec = parse_datetime_param("../2023-06-30").unwrap();
        assert_eq!(spec.bounds().0, None);

        let spec = parse_datetime_param("2023-01-01/..").unwrap();
        assert_eq!(spec.bounds().1, None);

        // Empty side behaves like ".."
        let spec = parse_datetime_param("2023-01-01/").unwrap();
        assert_eq!(spec.bounds().1, None);

        assert_eq!(parse_datetime_param("../.."), Err(TimeParseError::EmptyInterval));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        assert!(matches!(
            parse_datetime_param("2024-01-01/2023-01-01"),
            Err(TimeParseError::InvertedInterval(_))
        ));
    }

    #[test]
    fn test_year_interval() {
        let (start, end) = year_interval(2023);
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
    }
}
