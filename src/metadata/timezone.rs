//! Timezone lookup from coordinates and reinterpretation of capture times

use crate::error::{Error, Result};
use crate::record::{CaptureTime, ImageData};
use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing::{debug, warn};
use tzf_rs::DefaultFinder;

/// Maps a geographic point to the IANA name of the timezone containing it
pub trait TimezoneLookup: Send + Sync {
    /// `None` when the point falls outside every known zone
    fn timezone_name(&self, longitude: f64, latitude: f64) -> Option<String>;
}

/// Point-in-polygon lookup over the bundled world timezone index
pub struct TzfLookup {
    finder: DefaultFinder,
}

impl TzfLookup {
    /// Load the timezone index. This is costly; build it once per process.
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }
}

impl Default for TzfLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TzfLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TzfLookup").finish_non_exhaustive()
    }
}

impl TimezoneLookup for TzfLookup {
    fn timezone_name(&self, longitude: f64, latitude: f64) -> Option<String> {
        let name = self.finder.get_tz_name(longitude, latitude);
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Resolve an IANA zone name
pub fn resolve_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|e| Error::TimezoneResolution {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Format a UTC offset in seconds as `+HHMM` / `-HHMM`
pub fn format_utc_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let offset = offset_seconds.unsigned_abs();
    format!("{sign}{:02}{:02}", offset / 3600, (offset % 3600) / 60)
}

/// Attach `tz` to a capture time
///
/// A value with zone information is converted into `tz`. A zone-less value
/// keeps its wall-clock components and is relabelled as local time in `tz`.
/// Returns `None` when the wall-clock time does not exist in `tz` (a
/// daylight-saving gap).
pub fn attach_zone(time: &CaptureTime, tz: Tz) -> Option<CaptureTime> {
    match time {
        CaptureTime::Offset(dt) => Some(CaptureTime::Zoned(dt.with_timezone(&tz))),
        CaptureTime::Zoned(dt) => Some(CaptureTime::Zoned(dt.with_timezone(&tz))),
        CaptureTime::Naive(_) | CaptureTime::Utc(_) => tz
            .from_local_datetime(&time.wall_clock())
            .earliest()
            .map(CaptureTime::Zoned),
    }
}

/// Apply the derived zone in `record.gps_time_zone` to the record
///
/// Sets `time_offset` to the zone's offset at `now` (not at the capture
/// instant) and flags `has_time_offset`, then attaches the zone to the
/// primary, original and digitized capture times. Returns the resolved
/// zone for further use.
pub fn adjust_time_with_timezone(record: &mut ImageData, now: DateTime<Utc>) -> Result<Tz> {
    let tz = resolve_zone(&record.gps_time_zone)?;

    let offset = now.with_timezone(&tz).offset().fix().local_minus_utc();
    record.time_offset = format_utc_offset(offset);
    record.has_time_offset = true;
    debug!(zone = tz.name(), offset = %record.time_offset, "Derived time offset");

    for (name, slot) in [
        ("DateTimeOriginal", &mut record.date_time_original),
        ("DateTimeDigitized", &mut record.date_time_digitized),
        ("DateTime", &mut record.date_time),
    ] {
        let Some(time) = slot.as_ref() else {
            continue;
        };

        match attach_zone(time, tz) {
            Some(adjusted) => *slot = Some(adjusted),
            None => warn!(
                field = name,
                zone = tz.name(),
                wall_clock = %time.wall_clock(),
                "Capture time does not exist in zone, left unchanged"
            ),
        }
    }

    Ok(tz)
}
