//! Aggregating pipeline
//!
//! Walks the tree, encodes every image, and emits a single generated Dart
//! source file holding one `const Map<String, String>` from forward-slash
//! relative paths to Base64 payloads. No source file is touched.

use crate::config::Config;
use crate::discover::collect_images;
use crate::encode::encode_image;
use crate::error::Result;
use crate::progress::{RunStats, render_progress_line};
use crate::sniff::is_valid_image;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Outcome of an aggregating run
#[derive(Debug)]
pub struct AggregateReport {
    pub stats: RunStats,
    /// The generated file, when at least one image was encoded
    pub output: Option<PathBuf>,
}

/// Aggregating converter: many images in, one generated map file out
pub struct Aggregator {
    config: Config,
}

impl Aggregator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scan, encode, and emit the map file.
    ///
    /// The aggregating flow always recurses. Content validation is opt-in
    /// here (`validate = true`); nothing destructive happens either way.
    pub fn run(&self) -> Result<AggregateReport> {
        info!(root = %self.config.root.display(), "Scanning for image files");
        let candidates = collect_images(&self.config.root, true, |ext| {
            self.config.is_aggregate_supported(ext)
        })?;

        if candidates.is_empty() {
            info!("No image files found");
            return Ok(AggregateReport {
                stats: RunStats::new(0),
                output: None,
            });
        }

        info!(count = candidates.len(), "Found image files");

        let mut stats = RunStats::new(candidates.len());
        // BTreeMap keeps keys lexicographically sorted, so the generated
        // file diffs cleanly between runs
        let mut mapping: BTreeMap<String, String> = BTreeMap::new();

        for candidate in &candidates {
            debug!(path = ?candidate.path, extension = %candidate.extension, "Processing file");

            if self.config.validate && !is_valid_image(&candidate.path) {
                warn!(path = ?candidate.path, "Skipping file that is not a valid image");
                stats.record_failure();
                println!("{}", render_progress_line(&stats));
                continue;
            }

            match encode_image(&self.config.root, &candidate.path) {
                Ok(image) => {
                    // Two sources can land on one key on case-insensitive
                    // filesystems; last write wins, but never silently
                    if let Some(_previous) = mapping.insert(image.relative_path.clone(), image.data)
                    {
                        warn!(
                            key = %image.relative_path,
                            path = ?candidate.path,
                            "Relative path collides with an earlier entry, keeping the later one"
                        );
                    }
                    stats.record_success();
                }
                Err(e) => {
                    error!(path = ?candidate.path, error = %e, "Failed to encode file");
                    stats.record_failure();
                }
            }
            println!("{}", render_progress_line(&stats));
        }

        if mapping.is_empty() {
            warn!("No images could be encoded, not writing an output file");
            info!("{}", stats.summary());
            return Ok(AggregateReport {
                stats,
                output: None,
            });
        }

        let output = self.config.output_file.clone();
        if self.config.dry_run {
            info!(output = %output.display(), entries = mapping.len(), "Would write map file");
        } else {
            if let Some(parent) = output.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output, render_dart_map(&mapping))?;
            info!(output = %output.display(), entries = mapping.len(), "Wrote map file");
        }

        info!("{}", stats.summary());
        Ok(AggregateReport {
            stats,
            output: Some(output),
        })
    }
}

/// Render the mapping as a Dart source file with a machine-generated header
pub fn render_dart_map(mapping: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// GENERATED by img64 on {} - do not edit by hand.\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("const Map<String, String> base64Images = {\n");
    for (key, value) in mapping {
        out.push_str(&format!(
            "  '{}': '{}',\n",
            escape_dart(key),
            escape_dart(value)
        ));
    }
    out.push_str("};\n");
    out
}

/// Escape a string for a single-quoted Dart literal.
///
/// Base64 payloads never contain any of these characters, but the emitter
/// must stay correct if a future encoder produces arbitrary text.
fn escape_dart(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '$' => escaped.push_str("\\$"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => {
                escaped.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
            c => escaped.push(c),
        }
    }
    escaped
}
