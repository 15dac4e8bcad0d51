//! Error types for EXIF metadata decoding

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for metadata decoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for metadata decoding
///
/// Only [`Error::MetadataMap`] and [`Error::DirectoryIndex`] are fatal to a
/// parse. The remaining decoding variants are field or GPS-block scoped: they
/// are logged where they happen and the record keeps its zero values.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to extract EXIF entries: {0}")]
    MetadataMap(String),

    #[error("Failed to build IFD index: {0}")]
    DirectoryIndex(String),

    #[error("Failed to set field {field}: {message}")]
    FieldCoercion { field: &'static str, message: String },

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid format for Rational: {0}")]
    InvalidRational(String),

    #[error("Unable to parse time: {0}")]
    TimestampParse(String),

    #[error("No GPS info found")]
    GpsDirectoryMissing,

    #[error("Failed to parse GPS info: {0}")]
    GpsInfo(String),

    #[error("Invalid GPS coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Failed to load timezone location {name}: {message}")]
    TimezoneResolution { name: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
