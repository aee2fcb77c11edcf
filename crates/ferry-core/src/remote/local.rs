//! Local-filesystem helpers that sit beside the remote contract.

use log::{info, warn};
use std::fs;
use std::io;
use std::path::Path;

pub fn local_directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Rename a local file.
///
/// `Ok(false)` when `old` is not a regular file or `new` is already taken;
/// an existing destination is never overwritten.
pub fn rename_local_file(old: &Path, new: &Path) -> io::Result<bool> {
    if !old.is_file() {
        warn!("Cannot rename {}: no such file", old.display());
        return Ok(false);
    }
    if new.exists() {
        warn!("Cannot rename {} to {}: destination exists", old.display(), new.display());
        return Ok(false);
    }
    fs::rename(old, new)?;
    info!("Renamed {} → {}", old.display(), new.display());
    Ok(true)
}
