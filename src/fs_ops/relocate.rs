//! Relocator: move or copy a single file between two absolute paths.
//!
//! `move_file` tries an atomic rename and falls back to copy+delete. It never leaves
//! the file in both places: if the source cannot be removed after the copy, the copy
//! is removed again, and if that also fails the error says so explicitly.

use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::atomic::try_atomic_move;
use super::copy::safe_copy_and_rename;
use super::helpers::io_error_with_help;
use super::util::{first_missing_dir, is_cross_device, remove_created_dirs};
use crate::errors::DotsyncError;

/// Move `src` to `dst`, creating `dst`'s parents. Refuses to overwrite `dst`.
/// Parents created here are removed again when the move fails.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if fs::symlink_metadata(dst).is_ok() {
        bail!("refusing to overwrite existing destination '{}'", dst.display());
    }
    let Some(parent) = dst.parent() else {
        bail!("destination has no parent: {}", dst.display());
    };
    let created = first_missing_dir(parent);
    fs::create_dir_all(parent).map_err(io_error_with_help("create destination directory", parent))?;

    let moved = relocate(src, dst);
    if moved.is_err()
        && let Some(top) = &created
        && fs::symlink_metadata(dst).is_err()
    {
        remove_created_dirs(parent, top);
    }
    moved
}

fn relocate(src: &Path, dst: &Path) -> Result<()> {
    let err = match try_atomic_move(src, dst) {
        Ok(()) => {
            debug!(src = %src.display(), dst = %dst.display(), "renamed file");
            return Ok(());
        }
        Err(e) => e,
    };

    let hint = match err.downcast_ref::<std::io::Error>() {
        Some(ioe) if is_cross_device(ioe) => "cross-filesystem; copying instead",
        _ => "falling back to copy",
    };
    warn!(error = %err, hint, "rename failed");

    safe_copy_and_rename(src, dst)
        .with_context(|| format!("copy '{}' -> '{}'", src.display(), dst.display()))?;

    if let Err(e) = fs::remove_file(src) {
        let cause = io_error_with_help("remove source after copy", src)(e);
        return match fs::remove_file(dst) {
            Ok(()) => {
                info!(dst = %dst.display(), "removed copy after failing to remove source");
                Err(cause)
            }
            Err(e2) => Err(DotsyncError::RollbackFailed {
                cause: anyhow!(
                    "{cause:#}; the file now exists in both '{}' and '{}'",
                    src.display(),
                    dst.display()
                ),
                failures: vec![io_error_with_help("remove copied file", dst)(e2)],
            }
            .into()),
        };
    }

    debug!(src = %src.display(), dst = %dst.display(), "moved file via copy");
    Ok(())
}

/// Copy `src` to `dst` (bytes, permissions, timestamps), leaving `src` untouched.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    safe_copy_and_rename(src, dst)
        .with_context(|| format!("copy '{}' -> '{}'", src.display(), dst.display()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn moves_and_creates_parents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "a").unwrap();
        let dst = dir.path().join("x/y/a.txt");

        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "a");
    }

    #[test]
    fn failed_move_removes_created_parents() {
        let dir = tempdir().unwrap();
        let dst = dir.path().join("store/entry/a.txt");
        assert!(move_file(&dir.path().join("missing"), &dst).is_err());
        assert!(!dir.path().join("store").exists());
    }

    #[test]
    fn refuses_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, "a").unwrap();
        fs::write(&dst, "b").unwrap();

        assert!(move_file(&src, &dst).is_err());
        assert_eq!(fs::read_to_string(&src).unwrap(), "a");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "b");
    }

    #[test]
    fn copy_keeps_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        fs::write(&src, "a").unwrap();
        let dst = dir.path().join("sub/b");
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read(&src).unwrap(), fs::read(&dst).unwrap());
    }
}
