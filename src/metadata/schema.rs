//! Declarative field table mapping record fields to EXIF tag aliases

use crate::error::{Error, Result};
use crate::metadata::coerce::FieldValue;
use crate::record::{CaptureTime, ImageData};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Semantic type of a record field, which selects the coercion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Timestamp,
    Rational,
}

macro_rules! define_fields {
    ( $( $variant:ident => $kind:ident, [ $( $alias:literal ),* ] ),+ $(,)? ) => {
        /// Every field of [`ImageData`] that is sourced from EXIF tags
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $( $variant, )+
        }

        impl Field {
            /// All fields, in record declaration order
            pub const ALL: &'static [Field] = &[ $( Field::$variant, )+ ];

            /// Field name as used in logs and for the GPS prefix rule
            pub fn name(self) -> &'static str {
                match self {
                    $( Field::$variant => stringify!($variant), )+
                }
            }

            /// Semantic type of the field
            pub fn kind(self) -> FieldKind {
                match self {
                    $( Field::$variant => FieldKind::$kind, )+
                }
            }

            /// Acceptable source tag names, in priority order
            pub fn aliases(self) -> &'static [&'static str] {
                match self {
                    $( Field::$variant => &[ $( $alias ),* ], )+
                }
            }
        }
    };
}

define_fields! {
    // GPS information
    GPSLatitude => Float, ["GPSLatitude"],
    GPSLongitude => Float, ["GPSLongitude"],
    GPSAltitude => Float, ["GPSAltitude"],
    GPSTimestamp => Timestamp, ["GPSDateStamp", "GPSTimeStamp"],
    GPSProcessingMethod => String, ["GPSProcessingMethod"],
    GPSStatus => String, ["GPSStatus"],
    GPSSatellites => String, ["GPSSatellites"],
    GPSHPositioningError => Float, ["GPSHPositioningError"],
    GPSSpeed => Float, ["GPSSpeed"],
    GPSTrack => Float, ["GPSTrack"],
    GPSImgDirection => Float, ["GPSImgDirection"],
    GPSDestLatitude => Float, ["GPSDestLatitude"],
    GPSDestLongitude => Float, ["GPSDestLongitude"],
    GPSDestBearing => Float, ["GPSDestBearing"],
    GPSDestDistance => Float, ["GPSDestDistance"],

    // Camera
    CameraMake => String, ["Make", "CameraMake"],
    CameraModel => String, ["Model", "CameraModel"],
    CameraExposure => String, ["ExposureTime", "Exposure"],
    ISOSpeed => Integer, ["ISOSpeedRatings", "PhotographicSensitivity", "ISO"],
    ShutterSpeed => String, ["ShutterSpeedValue"],
    Software => String, ["Software"],
    DateTime => Timestamp, ["DateTime", "CreateDate"],
    DateTimeOriginal => Timestamp, ["DateTimeOriginal", "OriginalDateTime"],
    DateTimeDigitized => Timestamp, ["DateTimeDigitized", "DigitizedDateTime"],
    TimeOffset => String, ["OffsetTime", "OffsetTimeOriginal", "OffsetTimeDigitized"],
    SubSecOriginal => String, ["SubSecTimeOriginal", "SubSecTime"],

    // Lens
    LensMake => String, ["LensMake"],
    LensModel => String, ["LensModel", "Lens"],
    LensFocalLength => String, ["FocalLength"],
    LensAperture => String, ["FNumber", "ApertureValue"],
    LensFocalLength35mm => String, ["FocalLengthIn35mmFilm"],
    LensMaxAperture => String, ["MaxApertureValue"],
    LensMinAperture => String, ["MinApertureValue"],
    LensMaxFocalLength => String, ["MaxFocalLength"],

    // Image
    ImageWidth => Integer, ["ImageWidth", "PixelXDimension", "ExifImageWidth", "SourceImageWidth"],
    ImageHeight => Integer, ["ImageHeight", "ImageLength", "PixelYDimension", "ExifImageHeight", "SourceImageHeight"],
    ImageOrientation => Integer, ["Orientation"],
    ColorSpace => String, ["ColorSpace"],
    Compression => String, ["Compression"],
    XResolution => Rational, ["XResolution"],
    YResolution => Rational, ["YResolution"],
    ResolutionUnit => String, ["ResolutionUnit"],

    // Additional
    Artist => String, ["Artist", "Creator"],
    Copyright => String, ["Copyright", "CopyrightNotice"],
    Description => String, ["ImageDescription", "Description"],
    WhiteBalance => String, ["WhiteBalance"],
    Flash => String, ["Flash", "FlashFired"],
    MeteringMode => String, ["MeteringMode"],
    ExposureProgram => String, ["ExposureProgram"],
    SceneCaptureType => String, ["SceneCaptureType"],
    SubjectDistance => Float, ["SubjectDistance"],
    DigitalZoomRatio => Float, ["DigitalZoomRatio"],
}

impl Field {
    /// GPS fields are populated by the GPS pass, never by the generic walk
    pub fn is_gps(self) -> bool {
        self.name().starts_with("GPS")
    }
}

/// Resolved description of one field: its type and ordered tag candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: Field,
    pub kind: FieldKind,
    pub candidates: Vec<&'static str>,
}

impl FieldDescriptor {
    fn build(field: Field) -> Self {
        Self {
            field,
            kind: field.kind(),
            candidates: field.aliases().to_vec(),
        }
    }

    /// First candidate present in `metadata` with a non-empty value
    ///
    /// Later candidates are never consulted once one matches.
    pub fn resolve<'m>(&self, metadata: &'m HashMap<String, String>) -> Option<(&'static str, &'m str)> {
        self.candidates.iter().find_map(|name| {
            metadata
                .get(*name)
                .filter(|value| !value.is_empty())
                .map(|value| (*name, value.as_str()))
        })
    }
}

/// Process-wide table of field descriptors
///
/// Descriptors are built on first lookup and cached for the lifetime of the
/// schema. The cache sits behind a lock so parsers on several threads can
/// share one schema; [`FieldSchema::warm`] fills it up front.
#[derive(Debug, Default)]
pub struct FieldSchema {
    cache: RwLock<HashMap<Field, Arc<FieldDescriptor>>>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up (building on first use) the descriptor of `field`
    pub fn descriptor(&self, field: Field) -> Arc<FieldDescriptor> {
        if let Some(descriptor) = self.read_cache().get(&field) {
            return Arc::clone(descriptor);
        }

        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let descriptor = cache.entry(field).or_insert_with(|| {
            trace!(field = field.name(), "Building field descriptor");
            Arc::new(FieldDescriptor::build(field))
        });
        Arc::clone(descriptor)
    }

    /// Build every descriptor now, before concurrent use
    pub fn warm(&self) {
        for field in Field::ALL {
            self.descriptor(*field);
        }
    }

    /// Number of descriptors built so far
    pub fn cached_len(&self) -> usize {
        self.read_cache().len()
    }

    /// Descriptors walked by the generic pass: every non-GPS field
    pub fn generic_fields(&self) -> impl Iterator<Item = Arc<FieldDescriptor>> + '_ {
        Field::ALL
            .iter()
            .copied()
            .filter(|field| !field.is_gps())
            .map(|field| self.descriptor(field))
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Field, Arc<FieldDescriptor>>> {
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Store a coerced value into its record field
///
/// The value must match the field's semantic type.
pub fn assign(record: &mut ImageData, field: Field, value: FieldValue) -> Result<()> {
    use FieldValue as V;

    match (field, value) {
        (Field::GPSLatitude, V::Float(v)) => record.gps_latitude = v,
        (Field::GPSLongitude, V::Float(v)) => record.gps_longitude = v,
        (Field::GPSAltitude, V::Float(v)) => record.gps_altitude = v,
        (Field::GPSProcessingMethod, V::Text(v)) => record.gps_processing_method = v,
        (Field::GPSStatus, V::Text(v)) => record.gps_status = v,
        (Field::GPSSatellites, V::Text(v)) => record.gps_satellites = v,
        (Field::GPSHPositioningError, V::Float(v)) => record.gps_h_positioning_error = v,
        (Field::GPSSpeed, V::Float(v)) => record.gps_speed = v,
        (Field::GPSTrack, V::Float(v)) => record.gps_track = v,
        (Field::GPSImgDirection, V::Float(v)) => record.gps_img_direction = v,
        (Field::GPSDestLatitude, V::Float(v)) => record.gps_dest_latitude = v,
        (Field::GPSDestLongitude, V::Float(v)) => record.gps_dest_longitude = v,
        (Field::GPSDestBearing, V::Float(v)) => record.gps_dest_bearing = v,
        (Field::GPSDestDistance, V::Float(v)) => record.gps_dest_distance = v,

        (Field::CameraMake, V::Text(v)) => record.camera_make = v,
        (Field::CameraModel, V::Text(v)) => record.camera_model = v,
        (Field::CameraExposure, V::Text(v)) => record.camera_exposure = v,
        (Field::ISOSpeed, V::Integer(v)) => record.iso_speed = v,
        (Field::ShutterSpeed, V::Text(v)) => record.shutter_speed = v,
        (Field::Software, V::Text(v)) => record.software = v,
        (Field::DateTime, V::Timestamp(v)) => record.date_time = Some(v),
        (Field::DateTimeOriginal, V::Timestamp(v)) => record.date_time_original = Some(v),
        (Field::DateTimeDigitized, V::Timestamp(v)) => record.date_time_digitized = Some(v),
        (Field::TimeOffset, V::Text(v)) => record.time_offset = v,
        (Field::SubSecOriginal, V::Text(v)) => record.sub_sec_original = v,

        (Field::LensMake, V::Text(v)) => record.lens_make = v,
        (Field::LensModel, V::Text(v)) => record.lens_model = v,
        (Field::LensFocalLength, V::Text(v)) => record.lens_focal_length = v,
        (Field::LensAperture, V::Text(v)) => record.lens_aperture = v,
        (Field::LensFocalLength35mm, V::Text(v)) => record.lens_focal_length_35mm = v,
        (Field::LensMaxAperture, V::Text(v)) => record.lens_max_aperture = v,
        (Field::LensMinAperture, V::Text(v)) => record.lens_min_aperture = v,
        (Field::LensMaxFocalLength, V::Text(v)) => record.lens_max_focal_length = v,

        (Field::ImageWidth, V::Integer(v)) => record.image_width = v,
        (Field::ImageHeight, V::Integer(v)) => record.image_height = v,
        (Field::ImageOrientation, V::Integer(v)) => record.image_orientation = v,
        (Field::ColorSpace, V::Text(v)) => record.color_space = v,
        (Field::Compression, V::Text(v)) => record.compression = v,
        (Field::XResolution, V::Rational(v)) => record.x_resolution = v,
        (Field::YResolution, V::Rational(v)) => record.y_resolution = v,
        (Field::ResolutionUnit, V::Text(v)) => record.resolution_unit = v,

        (Field::Artist, V::Text(v)) => record.artist = v,
        (Field::Copyright, V::Text(v)) => record.copyright = v,
        (Field::Description, V::Text(v)) => record.description = v,
        (Field::WhiteBalance, V::Text(v)) => record.white_balance = v,
        (Field::Flash, V::Text(v)) => record.flash = v,
        (Field::MeteringMode, V::Text(v)) => record.metering_mode = v,
        (Field::ExposureProgram, V::Text(v)) => record.exposure_program = v,
        (Field::SceneCaptureType, V::Text(v)) => record.scene_capture_type = v,
        (Field::SubjectDistance, V::Float(v)) => record.subject_distance = v,
        (Field::DigitalZoomRatio, V::Float(v)) => record.digital_zoom_ratio = v,

        // GPS timestamps come from the GPS directory accessor, not from text
        (Field::GPSTimestamp, V::Timestamp(CaptureTime::Utc(v))) => record.gps_timestamp = Some(v),

        (field, value) => {
            return Err(Error::FieldCoercion {
                field: field.name(),
                message: format!("{:?} value does not fit a {:?} field", value.kind(), field.kind()),
            });
        }
    }

    Ok(())
}
