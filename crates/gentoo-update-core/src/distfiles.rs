//! Distfile cache cleanup

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Delete every regular file directly inside `dir`
///
/// Subdirectories and their contents are left alone. Returns the number of
/// files removed.
pub fn wipe_distfiles(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    debug!("Removed {} distfiles from {}", removed, dir.display());
    Ok(removed)
}
