use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Topmost ancestor of `dir` (inclusive) that does not exist yet.
pub(crate) fn first_missing_dir(dir: &Path) -> Option<PathBuf> {
    let mut missing = None;
    for a in dir.ancestors() {
        if a.as_os_str().is_empty() || fs::symlink_metadata(a).is_ok() {
            break;
        }
        missing = Some(a.to_path_buf());
    }
    missing
}

/// Remove `leaf` and its ancestors up to and including `top`, stopping at the
/// first one that is not empty.
pub(crate) fn remove_created_dirs(leaf: &Path, top: &Path) {
    if !leaf.starts_with(top) {
        return;
    }
    for a in leaf.ancestors() {
        if fs::remove_dir(a).is_err() || a == top {
            break;
        }
    }
}

pub(super) fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EXDEV,
        // ERROR_NOT_SAME_DEVICE
        #[cfg(windows)]
        Some(code) => code == 17,
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}

#[cfg(unix)]
pub(crate) fn fsync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
