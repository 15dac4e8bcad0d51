//! Typed output record produced by a metadata parse

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fraction with an integer numerator and denominator, as used by EXIF
/// for resolutions, exposure times and apertures.
///
/// The textual form is `N/D`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Floating point value of the fraction (non-finite when the denominator is zero)
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl FromStr for Rational {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [numerator, denominator] = parts.as_slice() else {
            return Err(Error::InvalidRational(s.to_string()));
        };

        let numerator = numerator
            .parse::<i64>()
            .map_err(|e| Error::InvalidRational(format!("{s}: {e}")))?;
        let denominator = denominator
            .parse::<i64>()
            .map_err(|e| Error::InvalidRational(format!("{s}: {e}")))?;

        Ok(Self::new(numerator, denominator))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A capture timestamp as decoded from EXIF, keeping track of what zone
/// information (if any) came with it.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTime {
    /// Wall-clock value with no zone annotation
    Naive(NaiveDateTime),
    /// Value marked with a literal `Z`. Cameras write this as a placeholder,
    /// so it is treated like a zone-less value when a zone is attached.
    Utc(DateTime<Utc>),
    /// Value carrying an explicit numeric UTC offset
    Offset(DateTime<FixedOffset>),
    /// Value attached to an IANA timezone
    Zoned(DateTime<Tz>),
}

impl CaptureTime {
    /// Whether the value carries real zone information (offset or IANA zone)
    pub fn has_zone(&self) -> bool {
        matches!(self, CaptureTime::Offset(_) | CaptureTime::Zoned(_))
    }

    /// Wall-clock components as recorded, year through sub-second
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            CaptureTime::Naive(dt) => *dt,
            CaptureTime::Utc(dt) => dt.naive_utc(),
            CaptureTime::Offset(dt) => dt.naive_local(),
            CaptureTime::Zoned(dt) => dt.naive_local(),
        }
    }

    /// IANA name of the attached zone, if any
    pub fn zone_name(&self) -> Option<&'static str> {
        match self {
            CaptureTime::Zoned(dt) => Some(dt.timezone().name()),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTime::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            CaptureTime::Utc(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            CaptureTime::Offset(dt) => {
                f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            CaptureTime::Zoned(dt) => write_zoned(f, dt),
        }
    }
}

impl Serialize for CaptureTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn write_zoned(f: &mut fmt::Formatter<'_>, dt: &DateTime<Tz>) -> fmt::Result {
    write!(
        f,
        "{}[{}]",
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        dt.timezone().name()
    )
}

fn serialize_local<S: Serializer>(
    value: &Option<DateTime<Tz>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.collect_str(&CaptureTime::Zoned(dt.clone())),
        None => serializer.serialize_none(),
    }
}

/// Structured photo metadata decoded from an EXIF payload
///
/// Every field starts at its zero value and is only overwritten when a value
/// is found and coerced successfully, so a partially filled record is a
/// normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageData {
    // GPS block, populated only by the GPS pass
    pub gps_latitude: f64,
    pub gps_longitude: f64,
    pub gps_altitude: f64,
    /// Determined from coordinates
    pub gps_time_zone: String,
    pub gps_timestamp: Option<DateTime<Utc>>,
    /// GPS timestamp converted into `gps_time_zone`
    #[serde(serialize_with = "serialize_local")]
    pub gps_timestamp_local: Option<DateTime<Tz>>,
    pub gps_processing_method: String,
    pub gps_status: String,
    pub gps_satellites: String,
    pub gps_h_positioning_error: f64,
    pub gps_speed: f64,
    pub gps_track: f64,
    pub gps_img_direction: f64,
    pub gps_dest_latitude: f64,
    pub gps_dest_longitude: f64,
    pub gps_dest_bearing: f64,
    pub gps_dest_distance: f64,

    // Camera
    pub camera_make: String,
    pub camera_model: String,
    pub camera_exposure: String,
    pub iso_speed: i64,
    pub shutter_speed: String,
    pub software: String,
    pub date_time: Option<CaptureTime>,
    pub date_time_original: Option<CaptureTime>,
    pub date_time_digitized: Option<CaptureTime>,
    /// Format: "+0200" or "-0700"
    pub time_offset: String,
    pub sub_sec_original: String,
    /// Set once a timezone was derived from GPS and an offset computed
    pub has_time_offset: bool,

    // Lens
    pub lens_make: String,
    pub lens_model: String,
    pub lens_focal_length: String,
    pub lens_aperture: String,
    pub lens_focal_length_35mm: String,
    pub lens_max_aperture: String,
    pub lens_min_aperture: String,
    pub lens_max_focal_length: String,

    // Image
    pub image_width: i64,
    pub image_height: i64,
    pub image_orientation: i64,
    pub color_space: String,
    pub compression: String,
    pub x_resolution: Rational,
    pub y_resolution: Rational,
    pub resolution_unit: String,

    // Additional
    pub artist: String,
    pub copyright: String,
    pub description: String,
    pub white_balance: String,
    pub flash: String,
    pub metering_mode: String,
    pub exposure_program: String,
    pub scene_capture_type: String,
    pub subject_distance: f64,
    pub digital_zoom_ratio: f64,
}
