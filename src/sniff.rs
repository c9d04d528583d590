//! Magic-byte sniffing for image formats
//!
//! A supported extension is not proof of anything: a text file renamed to
//! `.png` must never reach the destructive sink. Validation reads the leading
//! bytes of the file and checks them against known format signatures.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Longest signature we need to inspect (RIFF....WEBP)
const SNIFF_LEN: usize = 12;

/// Image formats recognized by signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Tiff,
    Ico,
}

impl ImageFormat {
    /// Detect the format from leading file bytes, if any matches
    pub fn detect(head: &[u8]) -> Option<ImageFormat> {
        if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if head.starts_with(b"BM") {
            Some(ImageFormat::Bmp)
        } else if head.starts_with(b"RIFF") && head.len() >= 12 && &head[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else if head.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || head.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            Some(ImageFormat::Tiff)
        } else if head.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            Some(ImageFormat::Ico)
        } else {
            None
        }
    }
}

/// Check whether the file content matches a known image signature.
///
/// Never raises: any I/O error while sniffing (missing file, permission
/// denied, shorter than the signature) is treated as "not a valid image".
pub fn is_valid_image(path: &Path) -> bool {
    sniff_format(path).is_some()
}

/// Detect the image format of a file by content, ignoring its extension
pub fn sniff_format(path: &Path) -> Option<ImageFormat> {
    let mut head = [0u8; SNIFF_LEN];
    let mut file = File::open(path).ok()?;
    // Partial reads are fine, short files simply fail detection
    let mut filled = 0;
    while filled < SNIFF_LEN {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return None,
        }
    }

    let format = ImageFormat::detect(&head[..filled]);
    trace!(?path, ?format, "Sniffed file signature");
    format
}
