//! img64 - Batch image to Base64 conversion
//!
//! This library provides functionality for turning directory trees of image
//! files into Base64 text, with support for:
//! - Recursive and flat directory discovery
//! - Magic-byte validation of image content
//! - A destructive flow replacing each image with a sibling text file
//! - An aggregating flow emitting one generated Dart map file
//! - Progress and ETA reporting

pub mod cli;
pub mod config;
pub mod convert;
pub mod discover;
pub mod embed;
pub mod encode;
pub mod error;
pub mod os;
pub mod progress;
pub mod sniff;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError};
pub use convert::{Converter, FileOutcome, ItemStatus, RunReport};
pub use embed::{AggregateReport, Aggregator};
pub use error::{Error, Result};
pub use progress::RunStats;
