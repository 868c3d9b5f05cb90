//! Atomic rename helper.
//! - Rename with context-rich errors; the io::Error stays reachable via downcast.
//! - On Windows, removes an existing destination first (MoveFile does not overwrite).
//! - On Unix, best-effort fsync of the destination directory after rename.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(crate) fn try_atomic_move(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst)
            .with_context(|| format!("remove existing destination '{}'", dst.display()))?;
    }

    fs::rename(src, dst)
        .with_context(|| format!("rename '{}' -> '{}'", src.display(), dst.display()))?;

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}
