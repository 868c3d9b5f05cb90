//! Config validation logic.

use anyhow::{Result, bail};
use std::fs;
use tracing::debug;

use super::paths::path_has_symlink_ancestor;
use super::types::Config;

impl Config {
    /// Sanity checks that do not touch the synced folder itself.
    pub fn validate(&self) -> Result<()> {
        if let Some(s) = &self.storage_path
            && s.trim().is_empty()
        {
            bail!("storage_path is empty; run `dotsync init` again");
        }

        if let Some(dir) = &self.backup_dir
            && let Ok(meta) = fs::metadata(dir)
            && !meta.is_dir()
        {
            bail!("backup_dir is not a directory: {}", dir.display());
        }

        if let Some(log) = &self.log_file {
            if log.is_dir() {
                bail!("log_file points to a directory: {}", log.display());
            }
            if path_has_symlink_ancestor(log)? {
                bail!("log_file has a symlinked ancestor: {}", log.display());
            }
        }

        debug!(
            storage = self.storage_path.as_deref().unwrap_or("<unset>"),
            log_level = %self.log_level,
            "config validated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rejects_directory_as_log_file() {
        let td = tempdir().unwrap();
        let cfg = Config {
            log_file: Some(td.path().to_path_buf()),
            ..Config::with_storage("~/Dropbox")
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_file_as_backup_dir() {
        let td = tempdir().unwrap();
        let f = td.path().join("f");
        fs::write(&f, "x").unwrap();
        let cfg = Config {
            backup_dir: Some(f),
            ..Config::with_storage("~/Dropbox")
        };
        assert!(cfg.validate().is_err());
        assert!(Config::with_storage("~/Dropbox").validate().is_ok());
        assert!(Config::with_storage("  ").validate().is_err());
    }
}
