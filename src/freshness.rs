//! Mtime-based freshness checks for published files.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Get the modification time of a regular file.
///
/// Returns `None` if the file doesn't exist, is not a regular file, or the mtime can't be read.
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata()
        .ok()
        .filter(|meta| meta.is_file())
        .and_then(|meta| meta.modified().ok())
}

/// Check whether a published file must be copied again.
///
/// A missing destination always needs a copy. An existing one is refreshed once it is older
/// than `threshold`; modification times in the future count as fresh.
pub fn needs_refresh(destination: &Path, now: SystemTime, threshold: Duration) -> bool {
    let Some(modified) = get_mtime(destination) else {
        return true;
    };

    now.duration_since(modified)
        .is_ok_and(|age| age > threshold)
}
