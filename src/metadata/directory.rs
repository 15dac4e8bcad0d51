//! Structured directory index over a decoded EXIF payload

use crate::error::{Error, Result};
use crate::metadata::entries::format_first;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use exif::{Context, Exif, Field, In, Tag, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// The directory (IFD) an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Directory {
    /// IFD0, the primary image
    Root,
    /// Exif sub-directory of the primary image
    Exif,
    /// GPS sub-directory of the primary image
    Gps,
    /// Interoperability sub-directory of the primary image
    Interop,
    /// IFD1, usually a thumbnail
    Thumbnail,
    /// Any further IFD some TIFF-based RAW formats carry
    Other(u16),
}

impl Directory {
    pub fn of(field: &Field) -> Self {
        match field.ifd_num {
            In::PRIMARY => match field.tag.context() {
                Context::Exif => Directory::Exif,
                Context::Gps => Directory::Gps,
                Context::Interop => Directory::Interop,
                _ => Directory::Root,
            },
            In::THUMBNAIL => Directory::Thumbnail,
            In(n) => Directory::Other(n),
        }
    }
}

/// Entries of a payload grouped by directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    directories: BTreeMap<Directory, Vec<Field>>,
}

impl DirectoryIndex {
    /// Group the entries of a decoded payload by directory
    ///
    /// A payload without a single entry cannot be indexed.
    pub fn collect(exif: &Exif) -> Result<Self> {
        let mut directories: BTreeMap<Directory, Vec<Field>> = BTreeMap::new();
        for field in exif.fields() {
            directories
                .entry(Directory::of(field))
                .or_default()
                .push(field.clone());
        }

        if directories.is_empty() {
            return Err(Error::DirectoryIndex("payload holds no IFD entries".into()));
        }

        debug!(directories = directories.len(), "Built IFD index");
        Ok(Self { directories })
    }

    /// Entries of one directory, if present
    pub fn directory(&self, directory: Directory) -> Option<&[Field]> {
        self.directories.get(&directory).map(Vec::as_slice)
    }

    /// The GPS sub-directory of the primary image, if present
    pub fn gps(&self) -> Option<GpsDirectory<'_>> {
        self.directory(Directory::Gps)
            .map(|fields| GpsDirectory { fields })
    }
}

/// View over the GPS sub-directory
#[derive(Debug, Clone, Copy)]
pub struct GpsDirectory<'a> {
    fields: &'a [Field],
}

/// Position and time decoded from the GPS sub-directory
#[derive(Debug, Clone, PartialEq)]
pub struct GpsInfo {
    /// Decimal degrees, negative south of the equator
    pub latitude: f64,
    /// Decimal degrees, negative west of Greenwich
    pub longitude: f64,
    /// Metres, negative below sea level
    pub altitude: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl<'a> GpsDirectory<'a> {
    pub fn get(&self, tag: Tag) -> Option<&'a Field> {
        self.fields.iter().find(|field| field.tag == tag)
    }

    /// Decode latitude, longitude, altitude and UTC timestamp
    ///
    /// Latitude and longitude are required. Zero denominators are passed
    /// through as non-finite coordinates for the caller to reject.
    pub fn gps_info(&self) -> Result<GpsInfo> {
        let latitude = self.coordinate(Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S')?;
        let longitude = self.coordinate(Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W')?;

        Ok(GpsInfo {
            latitude,
            longitude,
            altitude: self.altitude(),
            timestamp: self.timestamp(),
        })
    }

    fn coordinate(&self, value_tag: Tag, ref_tag: Tag, negative_ref: char) -> Result<f64> {
        let field = self
            .get(value_tag)
            .ok_or_else(|| Error::GpsInfo(format!("missing {value_tag}")))?;

        let degrees = match &field.value {
            Value::Rational(parts) if !parts.is_empty() => {
                let part = |i: usize| {
                    parts
                        .get(i)
                        .map(|r| r.num as f64 / r.denom as f64)
                        .unwrap_or(0.0)
                };
                part(0) + part(1) / 60.0 + part(2) / 3600.0
            }
            other => {
                return Err(Error::GpsInfo(format!(
                    "{value_tag} is not a degree/minute/second rational: {other:?}"
                )));
            }
        };

        let reference = self
            .get(ref_tag)
            .map(|f| format_first(&f.value))
            .unwrap_or_default();

        if reference.starts_with(negative_ref) {
            Ok(-degrees)
        } else {
            Ok(degrees)
        }
    }

    fn altitude(&self) -> f64 {
        let Some(Value::Rational(parts)) = self.get(Tag::GPSAltitude).map(|f| &f.value) else {
            return 0.0;
        };
        let Some(r) = parts.first() else {
            return 0.0;
        };

        let altitude = r.num as f64 / r.denom as f64;
        let below_sea_level = matches!(
            self.get(Tag::GPSAltitudeRef).map(|f| &f.value),
            Some(Value::Byte(v)) if v.first() == Some(&1)
        );

        if below_sea_level { -altitude } else { altitude }
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        let date = self.get(Tag::GPSDateStamp).map(|f| format_first(&f.value))?;
        let date = NaiveDate::parse_from_str(date.trim_end_matches('\0'), "%Y:%m:%d").ok()?;

        let Value::Rational(parts) = &self.get(Tag::GPSTimeStamp)?.value else {
            return None;
        };
        let [hours, minutes, seconds] = parts.as_slice() else {
            return None;
        };

        let seconds = hours.num as f64 / hours.denom as f64 * 3600.0
            + minutes.num as f64 / minutes.denom as f64 * 60.0
            + seconds.num as f64 / seconds.denom as f64;
        if !seconds.is_finite() || !(0.0..=86_400.0).contains(&seconds) {
            return None;
        }

        let millis = TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc() + millis)
    }
}
