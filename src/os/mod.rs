//! Platform-specific module for operating system features.

use std::path::Path;

#[cfg(windows)]
pub mod windows;

/// Free bytes available on the volume holding `path`.
///
/// The caller compares this against the source file size times the
/// configured safety margin before writing. Probe failure is reported as an
/// error so the run loop can decide how to count it.
#[cfg(unix)]
pub fn free_space(path: &Path) -> std::io::Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(std::io::Error::from)?;
    Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
}

/// Free bytes available on the volume holding `path`.
#[cfg(windows)]
pub fn free_space(path: &Path) -> std::io::Result<u64> {
    windows::free_space(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_space_probes_current_directory() {
        // The build directory's volume must report some free space
        let free = free_space(Path::new(".")).unwrap();
        assert!(free > 0);
    }
}
