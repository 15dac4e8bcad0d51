//! Batch processor with Rayon parallel processing
//!
//! Handles:
//! - Scanning inputs for image files
//! - Extracting the raw EXIF payload of each file
//! - Decoding it into a metadata record
//! - Rendering one JSON report per file

use crate::config::Config;
use crate::error::Result;
use crate::metadata::ExifDataParser;
use crate::metadata::container::extract_raw_exif;
use crate::metadata::schema::FieldSchema;
use crate::metadata::timezone::{TimezoneLookup, TzfLookup};
use crate::record::ImageData;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// Outcome of processing a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// An EXIF payload was found and decoded
    Parsed,
    /// The container holds no EXIF payload; an empty record is reported
    NoExif,
    /// Reading or decoding failed
    Failed,
}

/// Report for a single file, serialized as `{"path", "metadata"}` or
/// `{"path", "error"}`
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    #[serde(skip)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
    Metadata(Box<ImageData>),
    Error(String),
}

impl FileReport {
    /// Render as a single JSON document
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub total_files: AtomicUsize,
    pub parsed: AtomicUsize,
    pub empty: AtomicUsize,
    pub failed: AtomicUsize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, status: FileStatus) {
        let counter = match status {
            FileStatus::Parsed => &self.parsed,
            FileStatus::NoExif => &self.empty,
            FileStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Parsed: {}, Without EXIF: {}, Failed: {}",
            self.total_files.load(Ordering::Relaxed),
            self.parsed.load(Ordering::Relaxed),
            self.empty.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed)
        )
    }
}

/// Batch processor decoding the metadata of every image under the inputs
pub struct Processor {
    config: Config,
    parser: ExifDataParser,
    stats: Arc<ProcessingStats>,
}

impl Processor {
    /// Create a new processor with the given configuration
    ///
    /// The field schema and the timezone index are built here, once, and
    /// shared by every worker thread.
    pub fn new(config: Config) -> Self {
        // Configure Rayon thread pool
        if config.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build_global()
                .ok(); // Ignore if already initialized
        }

        let schema = Arc::new(FieldSchema::new());
        if config.warm_schema {
            schema.warm();
            debug!(descriptors = schema.cached_len(), "Field schema warmed");
        }

        let timezones: Option<Arc<dyn TimezoneLookup>> = if config.timezones {
            info!("Loading timezone index...");
            Some(Arc::new(TzfLookup::new()))
        } else {
            None
        };

        Self {
            config,
            parser: ExifDataParser::with_services(schema, timezones),
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    /// Run the processing pipeline
    ///
    /// Reports come back in the order the files were collected.
    pub fn run(&self) -> Result<Vec<FileReport>> {
        let _span = span!(Level::INFO, "processor_run").entered();

        info!("Scanning inputs...");
        let files = self.collect_files();
        info!(count = files.len(), "Found image files");

        self.stats.total_files.store(files.len(), Ordering::Relaxed);

        let reports: Vec<FileReport> = files
            .par_iter()
            .map(|path| {
                let report = self.process_single_file(path);
                self.stats.record(report.status);
                report
            })
            .collect();

        info!(summary = %self.stats.summary(), "Processing complete");
        Ok(reports)
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn process_single_file(&self, path: &Path) -> FileReport {
        let _span = span!(Level::DEBUG, "file", path = %path.display()).entered();

        let parsed = extract_raw_exif(path).and_then(|raw| match raw {
            Some(raw) => self.parser.parse(&raw).map(Some),
            None => Ok(None),
        });

        let (outcome, status) = match parsed {
            Ok(Some(record)) => (FileOutcome::Metadata(Box::new(record)), FileStatus::Parsed),
            Ok(None) => (FileOutcome::Metadata(Box::default()), FileStatus::NoExif),
            Err(e) => {
                warn!(error = %e, "Failed to read metadata");
                (FileOutcome::Error(e.to_string()), FileStatus::Failed)
            }
        };

        FileReport {
            path: path.to_path_buf(),
            outcome,
            status,
        }
    }

    /// Collect image files from the inputs
    ///
    /// Files named directly are always taken; directories are walked and
    /// filtered by extension. Paths under each directory are sorted.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for input in &self.config.inputs {
            if input.is_file() {
                files.push(input.clone());
                continue;
            }

            if !input.exists() {
                warn!(?input, "Input does not exist, skipping");
                continue;
            }

            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| !self.is_excluded_dir(e.path()))
                .filter_map(|e| e.ok())
                .filter(|entry| {
                    let path = entry.path();
                    path.is_file()
                        && path
                            .extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|ext| self.config.is_supported(ext))
                })
                .map(|entry| entry.into_path())
                .collect();

            found.sort();
            files.append(&mut found);
        }

        files
    }

    /// Check if a path should be excluded based on exclude_dirs configuration
    fn is_excluded_dir(&self, path: &Path) -> bool {
        for exclude in &self.config.exclude_dirs {
            // Check if it's an absolute path match
            if exclude.is_absolute() {
                if path.starts_with(exclude) {
                    debug!(?path, ?exclude, "Excluding directory (absolute path match)");
                    return true;
                }
            } else if let Some(exclude_name) = exclude.file_name() {
                // Check if any component of the path matches the exclude pattern
                for component in path.components() {
                    if let std::path::Component::Normal(name) = component
                        && name == exclude_name
                    {
                        debug!(?path, ?exclude, "Excluding directory (folder name match)");
                        return true;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fixtures::PayloadBuilder;
    use exif::{In, Tag};
    use std::fs;
    use tempfile::TempDir;

    fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn test_config(inputs: Vec<PathBuf>) -> Config {
        Config {
            inputs,
            exclude_dirs: vec![PathBuf::from("@eaDir")],
            timezones: false,
            ..Config::default()
        }
    }

    fn setup_tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let tiff = PayloadBuilder::new()
            .ascii(Tag::Make, In::PRIMARY, "Fujifilm")
            .ascii(Tag::DateTimeOriginal, In::PRIMARY, "2022:05:01 08:00:00")
            .build();
        fs::write(root.join("a_camera.jpg"), jpeg_with_exif(&tiff)).unwrap();
        fs::write(root.join("b_stripped.JPG"), [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        fs::write(root.join("c_broken.jpeg"), b"not an image at all").unwrap();
        fs::write(root.join("notes.txt"), b"ignored").unwrap();

        fs::create_dir(root.join("@eaDir")).unwrap();
        fs::write(root.join("@eaDir").join("thumb.jpg"), jpeg_with_exif(&tiff)).unwrap();

        dir
    }

    #[test]
    fn test_processing_stats() {
        let stats = ProcessingStats::new();
        stats.total_files.store(4, Ordering::Relaxed);
        stats.record(FileStatus::Parsed);
        stats.record(FileStatus::Parsed);
        stats.record(FileStatus::NoExif);
        stats.record(FileStatus::Failed);

        let summary = stats.summary();
        assert!(summary.contains("Total: 4"));
        assert!(summary.contains("Parsed: 2"));
        assert!(summary.contains("Without EXIF: 1"));
        assert!(summary.contains("Failed: 1"));
    }

    #[test]
    fn test_collect_files_filters_and_excludes() {
        let dir = setup_tree();
        let processor = Processor::new(test_config(vec![dir.path().to_path_buf()]));

        let names: Vec<String> = processor
            .collect_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a_camera.jpg", "b_stripped.JPG", "c_broken.jpeg"]);
    }

    #[test]
    fn test_run_reports_every_file() {
        let dir = setup_tree();
        let processor = Processor::new(test_config(vec![dir.path().to_path_buf()]));

        let reports = processor.run().unwrap();
        assert_eq!(reports.len(), 3);

        assert_eq!(reports[0].status, FileStatus::Parsed);
        match &reports[0].outcome {
            FileOutcome::Metadata(record) => assert_eq!(record.camera_make, "Fujifilm"),
            other => panic!("expected metadata, got {other:?}"),
        }

        assert_eq!(reports[1].status, FileStatus::NoExif);
        assert!(matches!(&reports[1].outcome, FileOutcome::Metadata(r) if **r == ImageData::default()));

        assert_eq!(reports[2].status, FileStatus::Failed);

        let stats = processor.stats();
        assert_eq!(stats.total_files.load(Ordering::Relaxed), 3);
        assert_eq!(stats.parsed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.empty.load(Ordering::Relaxed), 1);
        assert_eq!(stats.failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_explicit_file_bypasses_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.bin");
        fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

        let processor = Processor::new(test_config(vec![path.clone()]));
        assert_eq!(processor.collect_files(), vec![path]);
    }

    #[test]
    fn test_report_json_shape() {
        let ok = FileReport {
            path: PathBuf::from("photo.jpg"),
            outcome: FileOutcome::Metadata(Box::new(ImageData {
                camera_model: "X100V".into(),
                ..Default::default()
            })),
            status: FileStatus::Parsed,
        };
        let json: serde_json::Value = serde_json::from_str(&ok.to_json(false).unwrap()).unwrap();
        assert_eq!(json["path"], "photo.jpg");
        assert_eq!(json["metadata"]["camera_model"], "X100V");
        assert!(json.get("status").is_none());

        let failed = FileReport {
            path: PathBuf::from("broken.jpg"),
            outcome: FileOutcome::Error("Failed to read EXIF data".into()),
            status: FileStatus::Failed,
        };
        let pretty = failed.to_json(true).unwrap();
        assert!(pretty.contains('\n'));
        let json: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(json["error"], "Failed to read EXIF data");
        assert!(json.get("metadata").is_none());
    }
}
