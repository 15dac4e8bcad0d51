//! GPS block of the record: position, derived timezone and auxiliary fields

use crate::error::{Error, Result};
use crate::metadata::directory::{DirectoryIndex, GpsInfo};
use crate::metadata::entries::MetadataMap;
use crate::metadata::timezone::{TimezoneLookup, adjust_time_with_timezone};
use crate::record::ImageData;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Populates the GPS fields of a record from the GPS sub-directory
///
/// Every failure in here is non-fatal: it is logged and the affected GPS
/// fields keep their zero values.
#[derive(Clone, Copy)]
pub struct GpsExtractor<'a> {
    timezones: Option<&'a dyn TimezoneLookup>,
    now: DateTime<Utc>,
}

impl<'a> GpsExtractor<'a> {
    /// `now` is the instant used to compute the derived zone's UTC offset
    pub fn new(timezones: Option<&'a dyn TimezoneLookup>, now: DateTime<Utc>) -> Self {
        Self { timezones, now }
    }

    pub fn extract(&self, record: &mut ImageData, index: &DirectoryIndex, metadata: &MetadataMap) {
        let gps_info = index
            .gps()
            .ok_or(Error::GpsDirectoryMissing)
            .and_then(|gps| gps.gps_info());

        let info = match gps_info {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Skipping GPS fields");
                return;
            }
        };

        let zone = match validate_coordinates(&info) {
            Ok((latitude, longitude)) => {
                record.gps_latitude = latitude;
                record.gps_longitude = longitude;
                self.derive_zone(record)
            }
            Err(e) => {
                warn!(error = %e, "Skipping GPS position and timezone");
                None
            }
        };

        if let Some(timestamp) = info.timestamp {
            record.gps_timestamp = Some(timestamp);
            record.gps_timestamp_local = zone.map(|tz| timestamp.with_timezone(&tz));
        }

        if info.altitude != 0.0 {
            record.gps_altitude = info.altitude;
        }

        apply_auxiliary_fields(record, metadata);
    }

    fn derive_zone(&self, record: &mut ImageData) -> Option<Tz> {
        let timezones = self.timezones?;

        let Some(name) = timezones.timezone_name(record.gps_longitude, record.gps_latitude) else {
            warn!(
                latitude = record.gps_latitude,
                longitude = record.gps_longitude,
                "No timezone found for coordinates"
            );
            return None;
        };

        debug!(zone = %name, "Resolved timezone from coordinates");
        record.gps_time_zone = name;

        match adjust_time_with_timezone(record, self.now) {
            Ok(tz) => Some(tz),
            Err(e) => {
                warn!(error = %e, "Failed to apply timezone to capture times");
                None
            }
        }
    }
}

fn validate_coordinates(info: &GpsInfo) -> Result<(f64, f64)> {
    if info.latitude.is_finite() && info.longitude.is_finite() {
        Ok((info.latitude, info.longitude))
    } else {
        Err(Error::InvalidCoordinates {
            latitude: info.latitude,
            longitude: info.longitude,
        })
    }
}

/// Copy auxiliary GPS values from the map by exact tag name
///
/// Numeric values that do not parse as a plain float become zero without a
/// warning. Rational text such as `"5/1"` therefore yields zero.
fn apply_auxiliary_fields(record: &mut ImageData, metadata: &MetadataMap) {
    let text = |name: &str| metadata.get(name).cloned();
    let float = |name: &str| {
        metadata
            .get(name)
            .map(|value| value.parse::<f64>().unwrap_or_default())
    };

    if let Some(v) = text("GPSProcessingMethod") {
        record.gps_processing_method = v;
    }
    if let Some(v) = text("GPSStatus") {
        record.gps_status = v;
    }
    if let Some(v) = text("GPSSatellites") {
        record.gps_satellites = v;
    }

    for (name, slot) in [
        ("GPSHPositioningError", &mut record.gps_h_positioning_error),
        ("GPSSpeed", &mut record.gps_speed),
        ("GPSTrack", &mut record.gps_track),
        ("GPSImgDirection", &mut record.gps_img_direction),
        ("GPSDestLatitude", &mut record.gps_dest_latitude),
        ("GPSDestLongitude", &mut record.gps_dest_longitude),
        ("GPSDestBearing", &mut record.gps_dest_bearing),
        ("GPSDestDistance", &mut record.gps_dest_distance),
    ] {
        if let Some(v) = float(name) {
            *slot = v;
        }
    }
}
