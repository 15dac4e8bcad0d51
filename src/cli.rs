//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// photo-exif-meta - Decode photo EXIF metadata into JSON
///
/// Reads the EXIF block of every image found under the given paths and
/// prints one JSON report per file, with capture times attached to the
/// timezone derived from the photo's GPS position.
#[derive(Parser, Debug)]
#[command(name = "photo-exif-meta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long, env = "PHOTO_EXIF_META_CONFIG")]
    pub config: Option<PathBuf>,

    /// Image files or directories to scan
    pub inputs: Vec<PathBuf>,

    /// Directories to exclude from scanning (repeatable)
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Option<Vec<PathBuf>>,

    /// Only consider files with these extensions (comma separated)
    #[arg(short = 'e', long = "ext", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Number of threads for parallel processing (0 = auto)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Pretty-print each JSON report
    #[arg(short, long)]
    pub pretty: bool,

    /// Skip timezone derivation from GPS coordinates
    #[arg(long)]
    pub no_timezones: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub sample_config: bool,

    /// Write logs to this file in addition to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if !self.inputs.is_empty() {
            config.inputs = self.inputs.clone();
        }
        if let Some(ref exclude) = self.exclude {
            config.exclude_dirs = exclude.clone();
        }
        if let Some(ref extensions) = self.extensions {
            config.extensions = normalize_extensions(extensions);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.pretty {
            config.pretty = true;
        }
        if self.no_timezones {
            config.timezones = false;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
