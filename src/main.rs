//! photo-exif-meta - Decode photo EXIF metadata into JSON
//!
//! Walks the given files and directories, decodes the EXIF block of every
//! image and prints one JSON report per file on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use photo_exif_meta::{Cli, Config, Processor};
use std::io::{self, Write};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let _guard = setup_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "photo-exif-meta starting"
    );

    let config = load_config(&cli)?;
    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    let processor = Processor::new(config);
    let reports = processor.run()?;

    let pretty = processor.config().pretty;
    let mut stdout = io::stdout().lock();
    for report in &reports {
        writeln!(stdout, "{}", report.to_json(pretty)?)?;
    }
    stdout.flush()?;

    if let Some(ref log_file) = cli.log_file {
        info!(log_file = %log_file.display(), "Log saved to");
    }

    Ok(())
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.inputs.is_empty() {
        anyhow::bail!("No inputs given: pass image files or directories, or set `inputs` in the config file");
    }

    Ok(config)
}

/// Setup logging (stderr, plus an optional log file)
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (file_writer, guard) = match cli.log_file.as_deref() {
        Some(log_path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(log_path)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(file_writer.map(|writer| fmt::layer().json().with_ansi(false).with_writer(writer)))
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }

    Ok(guard)
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))
}
