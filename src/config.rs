//! Configuration for the batch metadata dump

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files or directories to scan for images
    pub inputs: Vec<PathBuf>,

    /// Directories to exclude from scanning (can be absolute paths or folder names)
    pub exclude_dirs: Vec<PathBuf>,

    /// File extensions considered images, lowercase, without the dot
    pub extensions: Vec<String>,

    /// Number of threads for parallel processing (0 = auto)
    pub threads: usize,

    /// Pretty-print each JSON report
    pub pretty: bool,

    /// Build every field descriptor before the parallel phase starts
    pub warm_schema: bool,

    /// Derive timezones from GPS coordinates
    pub timezones: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: vec![],
            exclude_dirs: vec![],
            extensions: vec![
                "jpg".into(), "jpeg".into(), "tif".into(), "tiff".into(),
                "png".into(), "webp".into(), "heic".into(), "heif".into(),
                "avif".into(), "dng".into(), "nef".into(), "arw".into(),
                "cr2".into(), "orf".into(), "rw2".into(), "pef".into(),
            ],
            threads: 0, // Auto-detect
            pretty: false,
            warm_schema: true,
            timezones: true,
        }
    }
}

impl Config {
    /// Check if a file extension is one of the configured image formats
    pub fn is_supported(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.extensions.iter().any(|e| e == &ext_lower)
    }

    /// Load configuration from a TOML file
    ///
    /// Keys missing from the file keep their default values.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# photo-exif-meta configuration file
# This file uses TOML format (https://toml.io)

# Files or directories to scan for images
inputs = [
    "D:/Photos",
]

# Directories to exclude from scanning
# Can be absolute paths or folder names (will match any folder with that name)
exclude_dirs = [
    ".thumbnails",
    "@eaDir",
]

# Extensions treated as images (EXIF is read from JPEG, TIFF-based RAW, PNG, WebP and HEIF containers)
extensions = ["jpg", "jpeg", "tif", "tiff", "png", "webp", "heic", "heif", "avif", "dng", "nef", "arw", "cr2", "orf", "rw2", "pef"]

# Number of threads for parallel processing (0 = auto-detect)
threads = 0

# Pretty-print each JSON report
pretty = false

# Build the field table before parsing in parallel
warm_schema = true

# Derive timezones from GPS coordinates and attach them to capture times
timezones = true
"#
        .to_string()
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}
