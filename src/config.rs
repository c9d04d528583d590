//! Configuration types for the converter

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default output file for the aggregating flow
pub const DEFAULT_MAP_FILE: &str = "base64_images.dart";

/// Configuration for a conversion run
///
/// The two flows carry separately configurable extension sets: the
/// destructive flow accepts the wider set (tiff/ico included), the
/// aggregating flow keeps to formats that render inside a Flutter asset map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory to scan for image files (the CLI positional argument
    /// overrides this)
    #[serde(default)]
    pub root: PathBuf,

    /// Recurse into subdirectories (destructive flow only; the aggregating
    /// flow always recurses)
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Output root for the destructive flow; when unset, text files land
    /// next to their source images
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Output file for the aggregating flow
    #[serde(default = "default_map_file")]
    pub output_file: PathBuf,

    /// Extensions handled by the destructive flow
    #[serde(default = "default_convert_extensions")]
    pub convert_extensions: Vec<String>,

    /// Extensions handled by the aggregating flow
    #[serde(default = "default_aggregate_extensions")]
    pub aggregate_extensions: Vec<String>,

    /// Free-space safety multiplier: a source file is only processed when
    /// its volume has at least `size * space_margin` bytes free
    #[serde(default = "default_space_margin")]
    pub space_margin: u64,

    /// Validate file content by magic bytes before aggregating.
    /// Off unless set here or via `--validate`; the destructive flow always
    /// validates and ignores this flag.
    #[serde(default)]
    pub validate: bool,

    /// Dry run mode - don't actually write or delete files
    #[serde(default)]
    pub dry_run: bool,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

fn default_map_file() -> PathBuf {
    PathBuf::from(DEFAULT_MAP_FILE)
}

fn default_convert_extensions() -> Vec<String> {
    vec![
        "jpg".into(),
        "jpeg".into(),
        "png".into(),
        "gif".into(),
        "bmp".into(),
        "webp".into(),
        "tiff".into(),
        "tif".into(),
        "ico".into(),
    ]
}

fn default_aggregate_extensions() -> Vec<String> {
    vec![
        "jpg".into(),
        "jpeg".into(),
        "png".into(),
        "gif".into(),
        "bmp".into(),
        "webp".into(),
    ]
}

fn default_space_margin() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            recursive: true,
            output_dir: None,
            output_file: default_map_file(),
            convert_extensions: default_convert_extensions(),
            aggregate_extensions: default_aggregate_extensions(),
            space_margin: default_space_margin(),
            validate: false,
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Check if an extension is handled by the destructive flow
    pub fn is_convert_supported(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.convert_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if an extension is handled by the aggregating flow
    pub fn is_aggregate_supported(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.aggregate_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Load configuration from a TOML file
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
        r#"# img64 Configuration File
# This file uses TOML format (https://toml.io)

# Root directory to scan for image files
root = "D:/Assets"

# Recurse into subdirectories (convert subcommand only)
recursive = true

# Output root for the convert subcommand
# When omitted, each .txt file lands next to its source image
# output_dir = "D:/Converted"

# Output file for the aggregate subcommand
output_file = "base64_images.dart"

# Extensions handled by each flow (customize as needed)
convert_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico"]
aggregate_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "webp"]

# Free-space safety multiplier for the convert subcommand:
# a file is only processed when its volume has size * space_margin bytes free
space_margin = 2

# Validate file content by magic bytes before aggregating
# (the convert subcommand always validates, regardless of this setting)
validate = false

# Dry run mode - show what would be done without actually doing it
dry_run = false

# Verbose output - show detailed processing information
verbose = false
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
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let config = Config::default();
        assert!(config.is_convert_supported("PNG"));
        assert!(config.is_convert_supported("Jpg"));
        assert!(!config.is_convert_supported("txt"));
    }

    #[test]
    fn test_extension_sets_are_independent() {
        let config = Config::default();
        // ico/tiff belong to the destructive flow only
        assert!(config.is_convert_supported("ico"));
        assert!(config.is_convert_supported("tif"));
        assert!(!config.is_aggregate_supported("ico"));
        assert!(!config.is_aggregate_supported("tif"));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(config.space_margin, 2);
        assert!(!config.validate);
    }

    #[test]
    fn test_validate_defaults_off_when_file_omits_it() {
        let config: Config = toml::from_str("root = \"/tmp/images\"").unwrap();
        assert!(!config.validate);

        let config: Config = toml::from_str("validate = true").unwrap();
        assert!(config.validate);
    }
}
