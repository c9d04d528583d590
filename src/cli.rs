//! CLI argument parsing with clap

use crate::config::{Config, DEFAULT_MAP_FILE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// img64 - Batch image to Base64 conversion tool
///
/// Converts every image under a directory into Base64 text, either by
/// replacing each image with a sibling text file (`convert`) or by
/// collecting all encodings into one generated Dart map (`aggregate`).
#[derive(Parser, Debug)]
#[command(name = "img64")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Additionally write logs to this file (or into this directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace each image with a Base64 text file, deleting the original
    Convert {
        /// Directory to scan for image files
        directory: PathBuf,

        /// Do not recurse into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Write text files under this directory instead of next to the
        /// sources, preserving the relative structure (created if missing)
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Dry run mode - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Collect all image encodings into one generated Dart map file
    Aggregate {
        /// Directory to scan for image files
        directory: PathBuf,

        /// Output file for the generated map
        #[arg(short = 'o', long, default_value = DEFAULT_MAP_FILE)]
        output: PathBuf,

        /// Validate file content by magic bytes before encoding
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        self.apply(&mut config);
        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        self.apply(&mut config);
        config
    }

    fn apply(&self, config: &mut Config) {
        if self.verbose {
            config.verbose = true;
        }

        match self.command {
            Command::Convert {
                ref directory,
                no_recursive,
                ref output_dir,
                dry_run,
            } => {
                config.root = directory.clone();
                if no_recursive {
                    config.recursive = false;
                }
                if let Some(output_dir) = output_dir {
                    config.output_dir = Some(output_dir.clone());
                }
                if dry_run {
                    config.dry_run = true;
                }
                // Validation is not negotiable when originals get deleted
                config.validate = true;
            }
            Command::Aggregate {
                ref directory,
                ref output,
                validate,
            } => {
                config.root = directory.clone();
                // The default value only wins when the config file did not
                // pick its own output
                if output != &PathBuf::from(DEFAULT_MAP_FILE) {
                    config.output_file = output.clone();
                }
                // Aggregation trusts extensions unless the flag or the
                // config file opts in explicitly
                if validate {
                    config.validate = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_args_map_onto_config() {
        let cli = Cli::parse_from([
            "img64",
            "convert",
            "/tmp/images",
            "--no-recursive",
            "-o",
            "/tmp/out",
            "-n",
        ]);
        let config = cli.to_config();
        assert_eq!(config.root, PathBuf::from("/tmp/images"));
        assert!(!config.recursive);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(config.dry_run);
        assert!(config.validate);
    }

    #[test]
    fn test_aggregate_defaults() {
        let cli = Cli::parse_from(["img64", "aggregate", "/tmp/images"]);
        let config = cli.to_config();
        assert_eq!(config.root, PathBuf::from("/tmp/images"));
        assert_eq!(config.output_file, PathBuf::from(DEFAULT_MAP_FILE));
        assert!(!config.validate);
    }

    #[test]
    fn test_aggregate_validate_opt_in() {
        let cli = Cli::parse_from(["img64", "aggregate", "/tmp/images", "--validate"]);
        let config = cli.to_config();
        assert!(config.validate);
    }

    #[test]
    fn test_aggregate_validate_stays_off_when_config_file_omits_it() {
        let cli = Cli::parse_from(["img64", "-C", "cfg.toml", "aggregate", "/tmp/images"]);
        let file_config: Config = toml::from_str("root = \"/tmp/other\"").unwrap();
        let config = cli.merge_with_config(file_config);
        assert!(!config.validate);
    }

    #[test]
    fn test_aggregate_validate_from_config_file_survives_merge() {
        let cli = Cli::parse_from(["img64", "-C", "cfg.toml", "aggregate", "/tmp/images"]);
        let file_config: Config = toml::from_str("validate = true").unwrap();
        let config = cli.merge_with_config(file_config);
        assert!(config.validate);
    }

    #[test]
    fn test_cli_output_overrides_config_file_value() {
        let cli = Cli::parse_from(["img64", "aggregate", "/tmp/images", "-o", "assets.dart"]);
        let mut file_config = Config::default();
        file_config.output_file = PathBuf::from("from_file.dart");
        let config = cli.merge_with_config(file_config);
        assert_eq!(config.output_file, PathBuf::from("assets.dart"));
    }
}
