//! photo-exif-meta - Typed photo metadata from raw EXIF payloads
//!
//! This library decodes the EXIF block of a photo into a structured
//! [`ImageData`] record with support for:
//! - Ordered tag aliases per record field, with type-directed coercion
//! - Thumbnail (IFD1) suppression
//! - GPS position, altitude and timestamp decoding
//! - Timezone derivation from GPS coordinates, attached to capture times
//! - Payload extraction from JPEG, TIFF, PNG, WebP and HEIF containers
//! - Parallel batch processing with Rayon

pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod process;
pub mod record;

pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use metadata::ExifDataParser;
pub use process::{FileReport, Processor};
pub use record::{CaptureTime, ImageData, Rational};
