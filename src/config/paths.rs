//! Default path helpers and symlink checks.

use anyhow::{Context, Result, anyhow};
use dirs::{cache_dir, config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Config file location: `$DOTSYNC_CONFIG` when set, else the OS config dir.
/// A relative override resolves against the current directory; a directory
/// override gets `config.xml` appended.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(p);
        if path.is_relative() {
            path = env::current_dir()
                .context("resolve current directory for DOTSYNC_CONFIG")?
                .join(path);
        }
        if path.is_dir() {
            path.push("config.xml");
        }
        return Ok(path);
    }
    config_dir()
        .map(|base| base.join("dotsync").join("config.xml"))
        .ok_or_else(|| anyhow!("cannot determine config directory; set {CONFIG_ENV}"))
}

/// Default log file under the OS data dir.
pub fn default_log_path() -> Result<PathBuf> {
    data_dir()
        .map(|base| base.join("dotsync").join("dotsync.log"))
        .ok_or_else(|| anyhow!("cannot determine data directory for the log file"))
}

/// Default snapshot directory under the OS cache dir.
pub fn default_backup_dir() -> Result<PathBuf> {
    cache_dir()
        .map(|base| base.join("dotsync").join("backups"))
        .ok_or_else(|| anyhow!("cannot determine cache directory for backups"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}
