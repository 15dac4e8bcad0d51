//! Locating the raw EXIF payload inside an image container

use crate::error::{Error, Result};
use exif::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Read the TIFF-structured EXIF payload embedded in `path`
///
/// JPEG, TIFF, PNG, WebP and HEIF containers are recognised. Returns
/// `Ok(None)` when the container is valid but carries no EXIF data.
pub fn extract_raw_exif(path: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => {
            debug!(path = %path.display(), bytes = exif.buf().len(), "Found EXIF payload");
            Ok(Some(exif.buf().to_vec()))
        }
        Err(exif::Error::NotFound(container)) => {
            debug!(path = %path.display(), container, "No EXIF payload in container");
            Ok(None)
        }
        Err(e) => Err(Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fixtures::PayloadBuilder;
    use exif::{In, Tag};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn jpeg_with_app1(tiff: &[u8]) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        let len = (tiff.len() + 8) as u16;
        jpeg.extend_from_slice(&len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_extracts_payload_from_jpeg() {
        let tiff = PayloadBuilder::new()
            .ascii(Tag::Make, In::PRIMARY, "Nikon")
            .build();
        let file = write_temp(&jpeg_with_app1(&tiff));

        let raw = extract_raw_exif(file.path()).unwrap().unwrap();
        assert_eq!(raw, tiff);
    }

    #[test]
    fn test_jpeg_without_exif() {
        let file = write_temp(&[0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(extract_raw_exif(file.path()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_container_is_an_error() {
        let file = write_temp(b"plain text, not an image");
        let result = extract_raw_exif(file.path());
        assert!(matches!(result, Err(Error::ExifRead { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_raw_exif(&dir.path().join("absent.jpg"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
