//! Base64 encoding of image files

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A fully encoded image, ready for a sink
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Path of the source image file
    pub source: PathBuf,
    /// Path relative to the scan root, forward-slash separated on every
    /// platform
    pub relative_path: String,
    /// Standard padded Base64 rendering of the file content
    pub data: String,
}

/// Read a file and render its content as standard padded Base64, no line
/// wrapping. Read failures (missing file, permission denied) surface as
/// [`Error::Read`] and become per-item failures in the run loop.
pub fn encode_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let encoded = STANDARD.encode(&bytes);
    trace!(?path, raw = bytes.len(), encoded = encoded.len(), "Encoded file");
    Ok(encoded)
}

/// Encode a file and pair it with its root-relative key
pub fn encode_image(root: &Path, path: &Path) -> Result<EncodedImage> {
    let data = encode_file(path)?;
    Ok(EncodedImage {
        source: path.to_path_buf(),
        relative_path: relative_key(root, path),
        data,
    })
}

/// Root-relative path as a mapping key: forward slashes regardless of
/// platform, case preserved
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
