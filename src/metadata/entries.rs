//! Flattening of EXIF directory entries into a tag-name → value map

use crate::error::{Error, Result};
use crate::metadata::directory::Directory;
use exif::{Exif, Field, Reader, Value};
use std::collections::HashMap;
use tracing::trace;

/// Tag name → value text, built fresh for every parse
pub type MetadataMap = HashMap<String, String>;

/// One flattened directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub tag_name: String,
    pub value: String,
    pub directory: Directory,
}

impl MetadataEntry {
    fn from_field(field: &Field) -> Self {
        // Tags unknown to the tag table have no usable name
        let tag_name = match field.tag.description() {
            Some(_) => field.tag.to_string(),
            None => String::new(),
        };

        Self {
            tag_name,
            value: format_first(&field.value),
            directory: Directory::of(field),
        }
    }
}

/// Decode a raw TIFF-structured EXIF payload
///
/// Failure here means no entry can be enumerated, which is fatal for the parse.
pub fn read_payload(raw: &[u8]) -> Result<Exif> {
    Reader::new()
        .read_raw(raw.to_vec())
        .map_err(|e| Error::MetadataMap(e.to_string()))
}

/// Every directory entry of the payload, in the reader's order
pub fn entries(exif: &Exif) -> impl Iterator<Item = MetadataEntry> + '_ {
    exif.fields().map(MetadataEntry::from_field)
}

/// Build the tag-name → value map from every entry outside the thumbnail
/// directory
///
/// Values are cut at the first NUL; entries with an empty name or an empty
/// leading segment are skipped. A tag seen in several directories keeps the
/// value of the entry visited last.
pub fn build_metadata_map(entries: impl IntoIterator<Item = MetadataEntry>) -> MetadataMap {
    let mut metadata = MetadataMap::new();

    for entry in entries {
        if entry.tag_name.is_empty() {
            continue;
        }

        // IFD1 is usually a thumbnail
        if entry.directory == Directory::Thumbnail {
            trace!(tag = %entry.tag_name, "Skipping thumbnail entry");
            continue;
        }

        let value = entry.value.split('\0').next().unwrap_or_default();
        if value.is_empty() {
            continue;
        }

        metadata.insert(entry.tag_name, value.to_string());
    }

    metadata
}

/// Render the first element of an entry value as text
///
/// ASCII values yield their first string, numbers are written in base 10,
/// rationals as `N/D`, and UNDEFINED bytes are read as text once an
/// ASCII or unspecified character-code prefix is removed.
pub fn format_first(value: &Value) -> String {
    fn first<T: ToString>(values: &[T]) -> String {
        values.first().map(ToString::to_string).unwrap_or_default()
    }

    match value {
        Value::Ascii(strings) => strings
            .first()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .unwrap_or_default(),
        Value::Byte(v) => first(v),
        Value::Short(v) => first(v),
        Value::Long(v) => first(v),
        Value::SByte(v) => first(v),
        Value::SShort(v) => first(v),
        Value::SLong(v) => first(v),
        Value::Float(v) => first(v),
        Value::Double(v) => first(v),
        Value::Rational(v) => v
            .first()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .unwrap_or_default(),
        Value::SRational(v) => v
            .first()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .unwrap_or_default(),
        Value::Undefined(bytes, _) => undefined_text(bytes),
        _ => String::new(),
    }
}

const CHARSET_ASCII: &[u8; 8] = b"ASCII\0\0\0";
const CHARSET_UNDEFINED: &[u8; 8] = &[0; 8];

fn undefined_text(bytes: &[u8]) -> String {
    let body = match bytes.split_first_chunk::<8>() {
        Some((prefix, rest)) if prefix == CHARSET_ASCII || prefix == CHARSET_UNDEFINED => rest,
        _ => bytes,
    };
    String::from_utf8_lossy(body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fixtures::PayloadBuilder;
    use exif::{In, Rational, Tag};

    fn entry(tag_name: &str, value: &str, directory: Directory) -> MetadataEntry {
        MetadataEntry {
            tag_name: tag_name.into(),
            value: value.into(),
            directory,
        }
    }

    #[test]
    fn test_skips_empty_names_and_values() {
        let metadata = build_metadata_map(vec![
            entry("", "orphan", Directory::Root),
            entry("Make", "", Directory::Root),
            entry("Model", "\0trailing", Directory::Root),
            entry("Software", "v1.0\0\0padding", Directory::Root),
        ]);

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["Software"], "v1.0");
    }

    #[test]
    fn test_thumbnail_entries_never_reach_the_map() {
        let metadata = build_metadata_map(vec![
            entry("Compression", "6", Directory::Thumbnail),
            entry("XResolution", "72/1", Directory::Root),
            entry("XResolution", "180/1", Directory::Thumbnail),
        ]);

        assert!(!metadata.contains_key("Compression"));
        assert_eq!(metadata["XResolution"], "72/1");
    }

    #[test]
    fn test_later_entry_overwrites_earlier() {
        let metadata = build_metadata_map(vec![
            entry("ImageWidth", "4000", Directory::Root),
            entry("ImageWidth", "3000", Directory::Exif),
        ]);
        assert_eq!(metadata["ImageWidth"], "3000");
    }

    #[test]
    fn test_format_first_values() {
        assert_eq!(
            format_first(&Value::Ascii(vec![b"Canon".to_vec(), b"ignored".to_vec()])),
            "Canon"
        );
        assert_eq!(format_first(&Value::Short(vec![400, 800])), "400");
        assert_eq!(format_first(&Value::SLong(vec![-5])), "-5");
        assert_eq!(
            format_first(&Value::Rational(vec![Rational { num: 1, denom: 125 }])),
            "1/125"
        );
        assert_eq!(
            format_first(&Value::Undefined(b"ASCII\0\0\0GPS".to_vec(), 0)),
            "GPS"
        );
        assert_eq!(format_first(&Value::Undefined(b"0230".to_vec(), 0)), "0230");
        assert_eq!(format_first(&Value::Short(vec![])), "");
    }

    #[test]
    fn test_read_payload_rejects_garbage() {
        let result = read_payload(b"definitely not exif");
        assert!(matches!(result, Err(Error::MetadataMap(_))));
    }

    #[test]
    fn test_entries_from_payload() {
        let raw = PayloadBuilder::new()
            .ascii(Tag::Make, In::PRIMARY, "Canon")
            .ascii(Tag::Make, In::THUMBNAIL, "Thumbnail Maker")
            .short(Tag::Orientation, In::PRIMARY, 6)
            .build();

        let exif = read_payload(&raw).unwrap();
        let all: Vec<MetadataEntry> = entries(&exif).collect();
        assert!(all.iter().any(|e| e.tag_name == "Make" && e.directory == Directory::Thumbnail));

        let metadata = build_metadata_map(all);
        assert_eq!(metadata["Make"], "Canon");
        assert_eq!(metadata["Orientation"], "6");
    }
}
