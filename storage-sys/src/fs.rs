// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;

use storage_types::StorageKind;

/// Classify `path` as a regular file, block device or directory.
///
/// Symlinks are followed. Anything else (sockets, fifos, character devices)
/// is rejected with `InvalidInput`.
pub fn classify_path(path: &str) -> io::Result<StorageKind> {
    let file_type = fs::metadata(path)?.file_type();
    if file_type.is_file() {
        Ok(StorageKind::File)
    } else if file_type.is_block_device() {
        Ok(StorageKind::Block)
    } else if file_type.is_dir() {
        Ok(StorageKind::Dir)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{path}' is not a file, block device or directory"),
        ))
    }
}

/// Absolute path of `path` with every symlink resolved.
pub fn canonicalize(path: &str) -> io::Result<String> {
    let resolved = fs::canonicalize(path)?;
    resolved.into_os_string().into_string().map_err(|raw| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", raw.to_string_lossy()),
        )
    })
}
