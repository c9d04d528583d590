//! Image file discovery
//!
//! Walks the root directory and yields candidate paths whose extension is in
//! the configured set. Candidates are extension-matched only; content
//! validation is the sniffer's job.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A discovered file with a supported extension, not yet validated
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    /// Absolute or root-relative path to the file
    pub path: PathBuf,
    /// Lowercased extension the file matched on
    pub extension: String,
}

/// Collect candidate image files under `root`.
///
/// `is_supported` receives the lowercased extension; callers pass the
/// config helper for their flow, so the two extension sets stay the single
/// source of truth. Symlinks are not followed, so cyclic link structures
/// cannot trap the walk. Unreadable subdirectories are skipped with a
/// warning; a missing or non-directory root is fatal. Order is
/// filesystem-traversal order.
pub fn collect_images<F>(root: &Path, recursive: bool, is_supported: F) -> Result<Vec<ImageCandidate>>
where
    F: Fn(&str) -> bool,
{
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if path.is_file()
            && let Some(ext) = path.extension().and_then(|e| e.to_str())
        {
            let ext_lower = ext.to_lowercase();
            if is_supported(&ext_lower) {
                candidates.push(ImageCandidate {
                    path: path.to_path_buf(),
                    extension: ext_lower,
                });
            }
        }
    }

    debug!(
        root = %root.display(),
        count = candidates.len(),
        recursive,
        "Collected image candidates"
    );

    Ok(candidates)
}
