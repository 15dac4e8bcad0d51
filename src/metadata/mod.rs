//! EXIF metadata decoding
//!
//! This module turns a raw EXIF payload into an [`ImageData`] record:
//! - Flattening directory entries into a tag-name map (thumbnail excluded)
//! - Indexing entries by directory for the GPS accessor
//! - Resolving record fields through ordered tag aliases
//! - Coercing text values to their field types
//! - Deriving a timezone from GPS coordinates and attaching it to capture times

pub mod coerce;
pub mod container;
pub mod directory;
pub mod entries;
pub mod gps;
pub mod schema;
pub mod timezone;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::Result;
use crate::record::ImageData;
use chrono::{DateTime, Utc};
use directory::DirectoryIndex;
use entries::MetadataMap;
use gps::GpsExtractor;
use schema::FieldSchema;
use std::fmt;
use std::sync::Arc;
use timezone::TimezoneLookup;
use tracing::{trace, warn};

/// Decodes raw EXIF payloads into [`ImageData`] records
///
/// The field schema and the timezone lookup are built once and shared, so
/// cloning a parser is cheap and clones can run on several threads.
#[derive(Clone)]
pub struct ExifDataParser {
    schema: Arc<FieldSchema>,
    timezones: Option<Arc<dyn TimezoneLookup>>,
}

impl ExifDataParser {
    /// Parser with a fresh schema and no timezone derivation
    pub fn new() -> Self {
        Self {
            schema: Arc::new(FieldSchema::new()),
            timezones: None,
        }
    }

    /// Parser sharing `schema` and deriving timezones through `timezones`
    pub fn with_services(schema: Arc<FieldSchema>, timezones: Option<Arc<dyn TimezoneLookup>>) -> Self {
        Self { schema, timezones }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Decode a raw TIFF-structured payload
    ///
    /// Only an unreadable payload is an error; every field-level problem is
    /// logged and leaves that field at its zero value.
    pub fn parse(&self, raw: &[u8]) -> Result<ImageData> {
        self.parse_at(raw, Utc::now())
    }

    /// Like [`parse`](Self::parse), computing derived UTC offsets as of `now`
    pub fn parse_at(&self, raw: &[u8], now: DateTime<Utc>) -> Result<ImageData> {
        let exif = entries::read_payload(raw)?;
        let metadata = entries::build_metadata_map(entries::entries(&exif));
        let index = DirectoryIndex::collect(&exif)?;

        let mut record = ImageData::default();
        self.apply_fields(&mut record, &metadata);
        GpsExtractor::new(self.timezones.as_deref(), now).extract(&mut record, &index, &metadata);

        Ok(record)
    }

    /// Generic pass: every non-GPS field, resolved by alias and coerced by kind
    fn apply_fields(&self, record: &mut ImageData, metadata: &MetadataMap) {
        for descriptor in self.schema.generic_fields() {
            let Some((tag, value)) = descriptor.resolve(metadata) else {
                continue;
            };

            let result = coerce::coerce(descriptor.kind, value)
                .and_then(|value| schema::assign(record, descriptor.field, value));

            match result {
                Ok(()) => trace!(field = descriptor.field.name(), tag, "Decoded field"),
                Err(e) => warn!(
                    field = descriptor.field.name(),
                    tag,
                    value,
                    error = %e,
                    "Failed to decode field"
                ),
            }
        }
    }
}

impl Default for ExifDataParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExifDataParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExifDataParser")
            .field("cached_descriptors", &self.schema.cached_len())
            .field("timezones", &self.timezones.is_some())
            .finish()
    }
}
