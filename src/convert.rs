//! Destructive conversion pipeline
//!
//! Replaces each validated image with a Base64 text file, either next to the
//! source or under a separate output root. The original is only deleted
//! after its text counterpart has been fully written and synced; if the
//! delete itself fails the item counts as a partial success and the text
//! file stays on disk.
//!
//! Processing is strictly sequential: one file goes through
//! validate -> probe -> encode -> write -> delete before the next starts.

use crate::config::Config;
use crate::discover::{ImageCandidate, collect_images};
use crate::encode::encode_file;
use crate::error::{Error, Result};
use crate::os::free_space;
use crate::progress::{RunStats, render_progress_line};
use crate::sniff::is_valid_image;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Extension given to the generated text files
const TEXT_EXTENSION: &str = "txt";

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Source image path
    pub source: PathBuf,
    /// Text file path (if one was written)
    pub destination: Option<PathBuf>,
    /// Processing status
    pub status: ItemStatus,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Status of a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Text file written, original deleted
    Success,
    /// Text file written but the original could not be deleted;
    /// counted as a failure in the run totals
    PartialSuccess,
    /// Nothing was written or deleted for this file
    Failed,
    /// Dry run - would have converted
    DryRun,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
    pub stats: RunStats,
}

impl RunReport {
    fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            stats: RunStats::new(0),
        }
    }
}

/// Destructive converter: image in, sibling text file out, image gone
pub struct Converter {
    config: Config,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the conversion over the configured root.
    ///
    /// Fatal errors (missing root, output root that cannot be created)
    /// propagate before any file is touched; everything else is a per-item
    /// failure recorded in the report.
    pub fn run(&self) -> Result<RunReport> {
        info!(root = %self.config.root.display(), "Scanning for image files");
        let candidates = collect_images(&self.config.root, self.config.recursive, |ext| {
            self.config.is_convert_supported(ext)
        })?;

        if candidates.is_empty() {
            info!("No image files found");
            return Ok(RunReport::empty());
        }

        if let Some(ref output_dir) = self.config.output_dir
            && !self.config.dry_run
        {
            fs::create_dir_all(output_dir)?;
        }

        info!(count = candidates.len(), "Found image files");

        let mut stats = RunStats::new(candidates.len());
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let outcome = self.process_single(candidate);
            match outcome.status {
                ItemStatus::Success | ItemStatus::DryRun => stats.record_success(),
                ItemStatus::PartialSuccess | ItemStatus::Failed => stats.record_failure(),
            }
            outcomes.push(outcome);
            println!("{}", render_progress_line(&stats));
        }

        info!("{}", stats.summary());
        Ok(RunReport { outcomes, stats })
    }

    fn process_single(&self, candidate: &ImageCandidate) -> FileOutcome {
        let path = candidate.path.as_path();
        debug!(?path, extension = %candidate.extension, "Processing file");

        // Extension matching got the file this far; the content has to prove
        // it is an image before anything destructive happens
        if !is_valid_image(path) {
            let e = Error::InvalidImage {
                path: path.to_path_buf(),
            };
            warn!(?path, "Skipping file that is not a valid image");
            return failed(path, e);
        }

        let size = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) => {
                let e = Error::Read {
                    path: path.to_path_buf(),
                    source: e,
                };
                error!(?path, error = %e, "Failed to stat file");
                return failed(path, e);
            }
        };

        // Conservative headroom: the text file is ~4/3 the source size, the
        // margin covers partial writes on a filling volume
        let needed = size.saturating_mul(self.config.space_margin);
        let available = match free_space(path) {
            Ok(free) => free,
            Err(e) => {
                warn!(?path, error = %e, "Could not probe free disk space");
                0
            }
        };
        if available < needed {
            let e = Error::InsufficientSpace {
                path: path.to_path_buf(),
                needed,
                available,
            };
            error!(?path, needed, available, "Insufficient disk space, skipping");
            return failed(path, e);
        }

        let encoded = match encode_file(path) {
            Ok(data) => data,
            Err(e) => {
                error!(?path, error = %e, "Failed to encode file");
                return failed(path, e);
            }
        };

        let dest = self.destination_for(path);

        if self.config.dry_run {
            info!(source = ?path, destination = ?dest, "Would convert file");
            return FileOutcome {
                source: path.to_path_buf(),
                destination: Some(dest),
                status: ItemStatus::DryRun,
                error: None,
            };
        }

        if let Err(e) = write_text_file(&dest, &encoded) {
            error!(?path, ?dest, error = %e, "Failed to write text file");
            return failed(path, e);
        }

        // Only now is the original allowed to go away
        if let Err(e) = fs::remove_file(path) {
            let e = Error::Delete {
                path: path.to_path_buf(),
                source: e,
            };
            warn!(?path, ?dest, error = %e, "Text file written but original could not be deleted");
            return FileOutcome {
                source: path.to_path_buf(),
                destination: Some(dest),
                status: ItemStatus::PartialSuccess,
                error: Some(e.to_string()),
            };
        }

        info!(source = ?path, destination = ?dest, "Converted file");
        FileOutcome {
            source: path.to_path_buf(),
            destination: Some(dest),
            status: ItemStatus::Success,
            error: None,
        }
    }

    /// Output path: sibling with a text extension, or the same root-relative
    /// location under the configured output directory
    fn destination_for(&self, source: &Path) -> PathBuf {
        match self.config.output_dir {
            Some(ref output_dir) => {
                let relative = source.strip_prefix(&self.config.root).unwrap_or(source);
                output_dir.join(relative).with_extension(TEXT_EXTENSION)
            }
            None => source.with_extension(TEXT_EXTENSION),
        }
    }
}

/// Write the encoding and make sure it is on disk before returning.
///
/// The sync matters: the write-then-delete ordering is only safe if the text
/// file survives an interrupt between the two steps.
fn write_text_file(dest: &Path, encoded: &str) -> Result<()> {
    let map_err = |e: std::io::Error| Error::Write {
        path: dest.to_path_buf(),
        source: e,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(map_err)?;
    }

    let mut file = File::create(dest).map_err(map_err)?;
    file.write_all(encoded.as_bytes()).map_err(map_err)?;
    file.sync_all().map_err(map_err)?;
    Ok(())
}

fn failed(path: &Path, e: Error) -> FileOutcome {
    FileOutcome {
        source: path.to_path_buf(),
        destination: None,
        status: ItemStatus::Failed,
        error: Some(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tempfile::TempDir;

    const PNG_HEAD: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    fn config_for(root: &Path) -> Config {
        Config {
            root: root.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_image_replaced_by_text_file() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("a.png");
        fs::write(&image, PNG_HEAD).unwrap();

        let report = Converter::new(config_for(dir.path())).run().unwrap();

        assert_eq!(report.stats.succeeded, 1);
        assert_eq!(report.stats.failed, 0);
        assert!(!image.exists());

        let text = fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(STANDARD.decode(&text).unwrap(), PNG_HEAD);
    }

    #[test]
    fn test_renamed_text_file_left_untouched() {
        let dir = TempDir::new().unwrap();
        let valid = dir.path().join("a.png");
        let fake = dir.path().join("b.png");
        fs::write(&valid, PNG_HEAD).unwrap();
        fs::write(&fake, b"just some text").unwrap();

        let report = Converter::new(config_for(dir.path())).run().unwrap();

        assert_eq!(report.stats.succeeded, 1);
        assert_eq!(report.stats.failed, 1);
        assert!(!valid.exists());
        assert!(dir.path().join("a.txt").exists());
        // The impostor keeps both its name and its content
        assert_eq!(fs::read(&fake).unwrap(), b"just some text");
        assert!(!dir.path().join("b.txt").exists());

        let failure = report
            .outcomes
            .iter()
            .find(|o| o.status == ItemStatus::Failed)
            .unwrap();
        assert!(failure.source.ends_with("b.png"));
    }

    #[test]
    fn test_output_dir_preserves_relative_structure() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let sub = dir.path().join("icons");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("home.png"), PNG_HEAD).unwrap();

        let config = Config {
            output_dir: Some(out.path().to_path_buf()),
            ..config_for(dir.path())
        };
        let report = Converter::new(config).run().unwrap();

        assert_eq!(report.stats.succeeded, 1);
        assert!(out.path().join("icons").join("home.txt").exists());
        assert!(!sub.join("home.png").exists());
    }

    #[test]
    fn test_empty_directory_reports_nothing() {
        let dir = TempDir::new().unwrap();
        let report = Converter::new(config_for(dir.path())).run().unwrap();
        assert_eq!(report.stats.total, 0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let config = config_for(Path::new("/nonexistent/root"));
        let err = Converter::new(config).run().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("a.png");
        fs::write(&image, PNG_HEAD).unwrap();

        let config = Config {
            dry_run: true,
            ..config_for(dir.path())
        };
        let report = Converter::new(config).run().unwrap();

        assert_eq!(report.outcomes[0].status, ItemStatus::DryRun);
        assert!(image.exists());
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_absurd_space_margin_fails_item_without_writing() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("a.png");
        fs::write(&image, PNG_HEAD).unwrap();

        let config = Config {
            space_margin: u64::MAX,
            ..config_for(dir.path())
        };
        let report = Converter::new(config).run().unwrap();

        assert_eq!(report.stats.failed, 1);
        assert!(image.exists());
        assert!(!dir.path().join("a.txt").exists());
        let outcome = &report.outcomes[0];
        assert!(outcome.error.as_ref().unwrap().contains("Insufficient"));
    }

    #[cfg(unix)]
    #[test]
    fn test_undeletable_original_is_partial_success() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let image = locked.join("a.png");
        fs::write(&image, PNG_HEAD).unwrap();
        let canary = locked.join("canary");
        fs::write(&canary, b"x").unwrap();

        // Read-only directory: files stay readable but cannot be unlinked
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        if fs::remove_file(&canary).is_ok() {
            // Directory permissions do not bind this user (running as root),
            // so the delete failure cannot be staged here
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let config = Config {
            output_dir: Some(out.path().to_path_buf()),
            ..config_for(dir.path())
        };
        let report = Converter::new(config).run().unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.succeeded, 0);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, ItemStatus::PartialSuccess);
        // Text file written and kept, original still in place
        assert!(out.path().join("locked").join("a.txt").exists());
        assert!(image.exists());
        assert!(outcome.error.as_ref().unwrap().contains("delete"));
    }

    #[test]
    fn test_non_recursive_run_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("deep");
        fs::create_dir(&sub).unwrap();
        let nested = sub.join("nested.png");
        fs::write(&nested, PNG_HEAD).unwrap();
        fs::write(dir.path().join("top.png"), PNG_HEAD).unwrap();

        let config = Config {
            recursive: false,
            ..config_for(dir.path())
        };
        let report = Converter::new(config).run().unwrap();

        assert_eq!(report.stats.total, 1);
        assert!(nested.exists());
        assert!(!dir.path().join("top.png").exists());
    }
}
