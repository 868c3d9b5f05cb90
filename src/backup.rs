//! Backup manager.
//!
//! A [`Backup`] snapshots one file (bytes and permission bits) before a destructive
//! step. The handle is consumed by exactly one of:
//! - [`Backup::restore`]: put the snapshot back, then delete it
//! - [`Backup::discard`]: delete the snapshot, leave the original alone
//! - [`Backup::keep`]: leave the snapshot in place for the user
//!
//! A failed restore never deletes the snapshot, so it can be recovered by hand.

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::fs_ops::{apply_metadata, copy_streaming, io_error_with_help, safe_copy_and_rename};

/// Collision counters tried after the plain timestamped name is taken.
const MAX_COLLISIONS: u32 = 999;

#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot `original` into the backup directory.
    /// Names are `<YYYYmmdd-HHMMSS>-<file>`, then `<ts>-<n>-<file>` on collision;
    /// an existing backup is never overwritten.
    pub fn create(&self, original: &Path) -> Result<Backup> {
        fs::create_dir_all(&self.dir)
            .map_err(io_error_with_help("create backup directory", &self.dir))?;

        let meta = fs::metadata(original).map_err(io_error_with_help("stat file to back up", original))?;
        let base = original
            .file_name()
            .ok_or_else(|| anyhow!("cannot back up a path without a file name: {}", original.display()))?
            .to_string_lossy()
            .into_owned();
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

        for n in 0..=MAX_COLLISIONS {
            let name = if n == 0 {
                format!("{stamp}-{base}")
            } else {
                format!("{stamp}-{n}-{base}")
            };
            let candidate = self.dir.join(name);
            match copy_streaming(original, &candidate) {
                Ok(bytes) => {
                    if let Err(e) = apply_metadata(&candidate, &meta) {
                        let _ = fs::remove_file(&candidate);
                        return Err(e).context("copy permissions to backup");
                    }
                    debug!(original = %original.display(), backup = %candidate.display(), bytes, "created backup");
                    return Ok(Backup {
                        original: original.to_path_buf(),
                        backup: candidate,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(io_error_with_help("create backup", original)(e)),
            }
        }
        Err(anyhow!(
            "too many backups of '{}' in {} within one second",
            base,
            self.dir.display()
        ))
    }
}

/// A pending snapshot of one file.
#[derive(Debug)]
#[must_use = "a backup must be restored, discarded or kept"]
pub struct Backup {
    original: PathBuf,
    backup: PathBuf,
}

impl Backup {
    pub fn original_path(&self) -> &Path {
        &self.original
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Put the snapshot back at the original path, replacing whatever is there
    /// (a symlink is replaced, not written through), then delete the snapshot.
    /// If the original already holds identical bytes only the snapshot is removed.
    pub fn restore(self) -> Result<()> {
        if self.original_is_intact()? {
            debug!(original = %self.original.display(), "original intact; dropping backup");
        } else {
            safe_copy_and_rename(&self.backup, &self.original).with_context(|| {
                format!(
                    "restore '{}' from backup; the backup is kept at '{}'",
                    self.original.display(),
                    self.backup.display()
                )
            })?;
            info!(original = %self.original.display(), "restored from backup");
        }
        if let Err(e) = fs::remove_file(&self.backup) {
            warn!(backup = %self.backup.display(), error = %e, "restored, but could not remove backup");
        }
        Ok(())
    }

    /// Delete the snapshot; the original location is not touched.
    pub fn discard(self) -> Result<()> {
        fs::remove_file(&self.backup).map_err(io_error_with_help("remove backup", &self.backup))
    }

    /// Leave the snapshot in the backup directory and return where it lives.
    pub fn keep(self) -> PathBuf {
        self.backup
    }

    fn original_is_intact(&self) -> Result<bool> {
        let meta = match fs::symlink_metadata(&self.original) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(io_error_with_help("inspect original", &self.original)(e)),
        };
        if !meta.file_type().is_file() {
            return Ok(false);
        }
        let backup_len = fs::metadata(&self.backup)
            .map_err(io_error_with_help("inspect backup", &self.backup))?
            .len();
        if meta.len() != backup_len {
            return Ok(false);
        }
        let current = fs::read(&self.original).map_err(io_error_with_help("read original", &self.original))?;
        let saved = fs::read(&self.backup).map_err(io_error_with_help("read backup", &self.backup))?;
        Ok(current == saved)
    }
}
