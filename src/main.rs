//! img64 - Batch image to Base64 conversion tool
//!
//! Scans a directory tree for image files and converts them to Base64 text,
//! either destructively (each image replaced by a .txt sibling) or by
//! aggregating everything into a single generated Dart map file.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use img64::{Aggregator, Cli, Command, Config, Converter, ItemStatus};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "img64 starting");

    let config = load_config(&cli)?;

    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    let exit_code = match cli.command {
        Command::Convert { .. } => run_convert(config),
        Command::Aggregate { .. } => run_aggregate(config),
    };

    // The non-blocking appender buffers in a worker thread; its guard must
    // drop before the process exits or the tail of the log file is lost
    drop(guard);
    std::process::exit(exit_code);
}

/// Run the destructive flow; exit 0 only when every item succeeded
fn run_convert(config: Config) -> i32 {
    let converter = Converter::new(config);
    match converter.run() {
        Ok(report) => {
            println!();
            if report.stats.total == 0 {
                println!("No images found");
                return 0;
            }

            println!("Done! {}", report.stats.summary());

            let failed_items: Vec<_> = report
                .outcomes
                .iter()
                .filter(|o| matches!(o.status, ItemStatus::Failed | ItemStatus::PartialSuccess))
                .collect();

            for outcome in &failed_items {
                let message = outcome.error.as_deref().unwrap_or("unknown error");
                match outcome.status {
                    ItemStatus::PartialSuccess => {
                        println!(
                            "  partial: {} (text file written, original kept): {}",
                            outcome.source.display(),
                            message
                        );
                    }
                    _ => {
                        println!("  failed: {}: {}", outcome.source.display(), message);
                    }
                }
            }

            if failed_items.is_empty() { 0 } else { 1 }
        }
        Err(e) => {
            error!(error = %e, "Conversion failed");
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Run the aggregating flow; only fatal errors produce a non-zero exit
fn run_aggregate(config: Config) -> i32 {
    let aggregator = Aggregator::new(config);
    match aggregator.run() {
        Ok(report) => {
            println!();
            match report.output {
                Some(output) => {
                    println!(
                        "Done! {} ({} written)",
                        report.stats.summary(),
                        output.display()
                    );
                }
                None => println!("No images found"),
            }
            0
        }
        Err(e) => {
            error!(error = %e, "Aggregation failed");
            eprintln!("Error: {}", e);
            1
        }
    }
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

    Ok(config)
}

/// Resolve the log file path; a directory argument gets a timestamped name
fn resolve_log_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        path.join(format!("img64_{}.log", timestamp))
    } else {
        path.to_path_buf()
    }
}

/// Setup logging: console on stderr, plus an optional non-blocking file layer
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(ref log_file) = cli.log_file {
        let log_path = resolve_log_path(log_file);
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        if cli.json_log {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        } else {
            subscriber
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }

        Ok(Some(guard))
    } else if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
        Ok(None)
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_log_path_gives_directories_a_timestamped_name() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_log_path(dir.path());
        let name = resolved.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("img64_"));
        assert!(name.ends_with(".log"));

        let file = dir.path().join("custom.log");
        assert_eq!(resolve_log_path(&file), file);
    }

    #[test]
    fn test_dropping_appender_guard_flushes_buffered_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let file = std::fs::File::create(&path).unwrap();

        let (mut writer, guard) = tracing_appender::non_blocking(file);
        writeln!(writer, "Converted file a.png").unwrap();
        writeln!(writer, "Total: 1, Processed: 1").unwrap();
        drop(writer);
        drop(guard);

        // Lines written just before shutdown must land in the file
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Converted file a.png"));
        assert!(content.contains("Total: 1, Processed: 1"));
    }
}
