//! Synthetic EXIF payloads for tests

use crate::metadata::timezone::TimezoneLookup;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;

/// Builds a raw TIFF-structured EXIF payload field by field
#[derive(Default)]
pub struct PayloadBuilder {
    fields: Vec<Field>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, tag: Tag, ifd_num: In, value: Value) -> Self {
        self.fields.push(Field {
            tag,
            ifd_num,
            value,
        });
        self
    }

    pub fn ascii(self, tag: Tag, ifd_num: In, text: &str) -> Self {
        self.field(tag, ifd_num, Value::Ascii(vec![text.as_bytes().to_vec()]))
    }

    pub fn short(self, tag: Tag, ifd_num: In, value: u16) -> Self {
        self.field(tag, ifd_num, Value::Short(vec![value]))
    }

    pub fn rational(self, tag: Tag, ifd_num: In, num: u32, denom: u32) -> Self {
        self.field(tag, ifd_num, Value::Rational(vec![Rational { num, denom }]))
    }

    /// Latitude/longitude in decimal degrees, written as DMS rationals
    /// with references taken from the signs
    pub fn gps_position(self, latitude: f64, longitude: f64) -> Self {
        let lat_ref = if latitude < 0.0 { "S" } else { "N" };
        let lon_ref = if longitude < 0.0 { "W" } else { "E" };
        self.gps_raw_latitude(dms(latitude), lat_ref)
            .gps_raw_longitude(dms(longitude), lon_ref)
    }

    pub fn gps_raw_latitude(self, parts: [(u32, u32); 3], reference: &str) -> Self {
        self.field(Tag::GPSLatitude, In::PRIMARY, rationals(parts))
            .ascii(Tag::GPSLatitudeRef, In::PRIMARY, reference)
    }

    pub fn gps_raw_longitude(self, parts: [(u32, u32); 3], reference: &str) -> Self {
        self.field(Tag::GPSLongitude, In::PRIMARY, rationals(parts))
            .ascii(Tag::GPSLongitudeRef, In::PRIMARY, reference)
    }

    pub fn gps_altitude(self, num: u32, denom: u32, below_sea_level: bool) -> Self {
        self.rational(Tag::GPSAltitude, In::PRIMARY, num, denom).field(
            Tag::GPSAltitudeRef,
            In::PRIMARY,
            Value::Byte(vec![u8::from(below_sea_level)]),
        )
    }

    pub fn gps_time(self, date: &str, hours: u32, minutes: u32, seconds: u32) -> Self {
        self.ascii(Tag::GPSDateStamp, In::PRIMARY, date).field(
            Tag::GPSTimeStamp,
            In::PRIMARY,
            rationals([(hours, 1), (minutes, 1), (seconds, 1)]),
        )
    }

    /// Serialize as a little-endian TIFF structure
    pub fn build(self) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }

        let mut buf = Cursor::new(Vec::new());
        writer
            .write(&mut buf, true)
            .expect("synthetic payload should serialize");
        buf.into_inner()
    }
}

fn rationals(parts: [(u32, u32); 3]) -> Value {
    Value::Rational(
        parts
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

fn dms(decimal: f64) -> [(u32, u32); 3] {
    let decimal = decimal.abs();
    let degrees = decimal.trunc();
    let minutes = ((decimal - degrees) * 60.0).trunc();
    let seconds = (decimal - degrees - minutes / 60.0) * 3600.0;

    [
        (degrees as u32, 1),
        (minutes as u32, 1),
        ((seconds * 1000.0).round() as u32, 1000),
    ]
}

/// Timezone lookup answering every point with the same zone name
pub struct FixedTimezone(pub Option<&'static str>);

impl TimezoneLookup for FixedTimezone {
    fn timezone_name(&self, _longitude: f64, _latitude: f64) -> Option<String> {
        self.0.map(str::to_string)
    }
}
