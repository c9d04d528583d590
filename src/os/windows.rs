//! Windows-specific operating system features.

use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use winapi::um::fileapi::GetDiskFreeSpaceExW;
use winapi::um::winnt::ULARGE_INTEGER;

/// Free bytes available to the caller on the volume holding `path`.
pub fn free_space(path: &Path) -> io::Result<u64> {
    // GetDiskFreeSpaceExW wants a directory; for a file path, probe its parent
    let dir = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };

    let wide: Vec<u16> = dir
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let mut available: ULARGE_INTEGER = unsafe { std::mem::zeroed() };

    let success = unsafe {
        GetDiskFreeSpaceExW(
            wide.as_ptr(),
            &mut available,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };

    if success == 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(unsafe { *available.QuadPart() })
}
