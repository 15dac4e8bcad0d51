//! Type-directed conversion of EXIF text values

use crate::error::{Error, Result};
use crate::metadata::schema::FieldKind;
use crate::record::{CaptureTime, Rational};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// A value converted to the semantic type of its field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(CaptureTime),
    Rational(Rational),
}

impl FieldValue {
    /// Semantic type this value satisfies
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::String,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Rational(_) => FieldKind::Rational,
        }
    }
}

/// Convert `value` according to `kind`
pub fn coerce(kind: FieldKind, value: &str) -> Result<FieldValue> {
    match kind {
        FieldKind::String => Ok(FieldValue::Text(value.to_string())),
        FieldKind::Integer => value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| Error::InvalidNumber(format!("failed to parse int {value:?}: {e}"))),
        FieldKind::Float => value
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|e| Error::InvalidNumber(format!("failed to parse float {value:?}: {e}"))),
        FieldKind::Timestamp => parse_timestamp(value).map(FieldValue::Timestamp),
        FieldKind::Rational => value.parse::<Rational>().map(FieldValue::Rational),
    }
}

/// Parse an EXIF date-time string
///
/// Layouts are tried in order and the first that parses wins:
/// 1. `YYYY:MM:DD HH:MM:SS` (zone-less)
/// 2. the same with a numeric zone suffix, `-0700`
/// 3. the same with milliseconds and a literal `Z`
/// 4. the same with a general zone suffix, `Z` or `-07:00`
///
/// Fractional seconds are accepted after the seconds field in every layout
/// except the third, which requires exactly three digits.
pub fn parse_timestamp(value: &str) -> Result<CaptureTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S%.f") {
        return Ok(CaptureTime::Naive(dt));
    }

    // numeric suffix only; a trailing `Z` belongs to the UTC layouts
    if !value.ends_with('Z')
        && let Ok(dt) = DateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S%.f%z")
    {
        return Ok(CaptureTime::Offset(dt));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S%.3fZ") {
        return Ok(CaptureTime::Utc(Utc.from_utc_datetime(&dt)));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S%.fZ") {
        return Ok(CaptureTime::Utc(Utc.from_utc_datetime(&dt)));
    }

    DateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S%.f%:z")
        .map(CaptureTime::Offset)
        .map_err(|e| Error::TimestampParse(format!("{value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_coerce_string_verbatim() {
        assert_eq!(
            coerce(FieldKind::String, "  Canon EOS ").unwrap(),
            FieldValue::Text("  Canon EOS ".into())
        );
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce(FieldKind::Integer, "400").unwrap(), FieldValue::Integer(400));
        assert_eq!(coerce(FieldKind::Integer, "-3").unwrap(), FieldValue::Integer(-3));
        assert_eq!(coerce(FieldKind::Float, "1.5").unwrap(), FieldValue::Float(1.5));

        assert!(coerce(FieldKind::Integer, "abc").is_err());
        assert!(coerce(FieldKind::Integer, "1.5").is_err());
        assert!(coerce(FieldKind::Float, "28/10").is_err());
    }

    #[test]
    fn test_coerce_rational() {
        assert_eq!(
            coerce(FieldKind::Rational, "72/1").unwrap(),
            FieldValue::Rational(Rational::new(72, 1))
        );
        assert!(matches!(
            coerce(FieldKind::Rational, "72"),
            Err(Error::InvalidRational(_))
        ));
    }

    #[test]
    fn test_parse_bare_layout() {
        let ts = parse_timestamp("2024:01:15 14:30:05").unwrap();
        assert!(matches!(ts, CaptureTime::Naive(_)));

        let dt = ts.wall_clock();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 5);
    }

    #[test]
    fn test_parse_bare_layout_with_fraction() {
        let ts = parse_timestamp("2024:01:15 14:30:05.120").unwrap();
        assert!(matches!(ts, CaptureTime::Naive(_)));
        assert_eq!(ts.wall_clock().nanosecond(), 120_000_000);
    }

    #[test]
    fn test_parse_numeric_zone_layout() {
        let ts = parse_timestamp("2024:01:15 14:30:05-0700").unwrap();
        match ts {
            CaptureTime::Offset(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), -7 * 3600);
                assert_eq!(dt.hour(), 14);
            }
            other => panic!("expected offset timestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_utc_marker_layout() {
        let ts = parse_timestamp("2024:01:15 14:30:05.250Z").unwrap();
        match ts {
            CaptureTime::Utc(dt) => {
                assert_eq!(dt.hour(), 14);
                assert_eq!(dt.nanosecond(), 250_000_000);
            }
            other => panic!("expected UTC timestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_general_zone_layout() {
        let ts = parse_timestamp("2024:01:15 14:30:05+02:00").unwrap();
        match ts {
            CaptureTime::Offset(dt) => assert_eq!(dt.offset().local_minus_utc(), 2 * 3600),
            other => panic!("expected offset timestamp, got {other:?}"),
        }

        let ts = parse_timestamp("2024:01:15 14:30:05Z").unwrap();
        assert!(matches!(ts, CaptureTime::Utc(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_layouts() {
        assert!(matches!(
            parse_timestamp("2024-01-15 14:30:05"),
            Err(Error::TimestampParse(_))
        ));
        assert!(parse_timestamp("    :  :     :  :  ").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
