//! Cloud storage layout and provider detection.
//!
//! Layout inside the synced folder:
//!   <storage>/dotsync/.dotsync.json      manifest
//!   <storage>/dotsync/<entry>/<relPath>  tracked files

use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::errors::DotsyncError;
use crate::fs_ops::io_error_with_help;
use crate::manifest::MANIFEST_FILE;
use crate::pathutil::{Home, join_slash};

pub const DOTSYNC_DIR: &str = "dotsync";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dotsync_dir(&self) -> PathBuf {
        self.root.join(DOTSYNC_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dotsync_dir().join(MANIFEST_FILE)
    }

    /// Where `rel_path` of entry `name` lives in storage.
    pub fn entry_file(&self, name: &str, rel_path: &str) -> PathBuf {
        join_slash(&self.dotsync_dir().join(name), rel_path)
    }

    /// The storage root must be a reachable directory (cloud folder mounted).
    pub fn ensure_available(&self) -> Result<()> {
        match fs::metadata(&self.root) {
            Ok(m) if m.is_dir() => Ok(()),
            _ => Err(DotsyncError::StorageUnavailable(self.root.clone()).into()),
        }
    }

    /// Create `<storage>/dotsync` if missing and return it.
    pub fn ensure_layout(&self) -> Result<PathBuf> {
        let dir = self.dotsync_dir();
        fs::create_dir_all(&dir).map_err(io_error_with_help("create dotsync directory", &dir))?;
        Ok(dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GoogleDrive,
    Dropbox,
    ICloud,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::GoogleDrive, Provider::Dropbox, Provider::ICloud];

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::GoogleDrive => "Google Drive",
            Provider::Dropbox => "Dropbox",
            Provider::ICloud => "iCloud Drive",
        }
    }

    /// Candidate locations in priority order, relative to home. Entries may be glob patterns.
    pub fn known_paths(self, macos: bool) -> &'static [&'static str] {
        if macos {
            match self {
                Provider::GoogleDrive => &["Library/CloudStorage/GoogleDrive-*/My Drive", "Google Drive"],
                Provider::Dropbox => &["Library/CloudStorage/Dropbox", "Dropbox"],
                Provider::ICloud => &["Library/Mobile Documents/com~apple~CloudDocs"],
            }
        } else if cfg!(windows) {
            match self {
                Provider::GoogleDrive => &["Google Drive"],
                Provider::Dropbox => &["Dropbox"],
                Provider::ICloud => &["iCloudDrive"],
            }
        } else {
            match self {
                Provider::GoogleDrive => &["Google Drive", "google-drive"],
                Provider::Dropbox => &["Dropbox"],
                Provider::ICloud => &[],
            }
        }
    }

    /// First existing directory among the known locations.
    pub fn detect(self, home: &Home) -> Option<PathBuf> {
        for rel in self.known_paths(home.is_macos()) {
            let candidate = home.dir().join(rel);
            if rel.contains(['*', '?', '[']) {
                let pattern = glob::Pattern::escape(&home.dir().to_string_lossy());
                let full = format!("{pattern}/{rel}");
                let Ok(paths) = glob::glob(&full) else {
                    continue;
                };
                if let Some(found) = paths.flatten().find(|p| p.is_dir()) {
                    debug!(provider = %self, path = %found.display(), "detected storage");
                    return Some(found);
                }
            } else if candidate.is_dir() {
                debug!(provider = %self, path = %candidate.display(), "detected storage");
                return Some(candidate);
            }
        }
        None
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::GoogleDrive => "gdrive",
            Provider::Dropbox => "dropbox",
            Provider::ICloud => "icloud",
        })
    }
}

impl FromStr for Provider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gdrive" | "googledrive" | "google-drive" => Ok(Provider::GoogleDrive),
            "dropbox" => Ok(Provider::Dropbox),
            "icloud" => Ok(Provider::ICloud),
            other => Err(format!(
                "unknown provider '{other}' (expected gdrive, dropbox or icloud)"
            )),
        }
    }
}

/// A usable storage path exists, is a directory, and accepts new files.
pub fn validate_storage_dir(path: &Path) -> Result<()> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => bail!("storage path does not exist: {}", path.display()),
    };
    if !meta.is_dir() {
        bail!("storage path is not a directory: {}", path.display());
    }
    let probe = path.join(".dotsync-write-test");
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(io_error_with_help("write to storage path", path))
        .with_context(|| format!("cannot write to storage path: {}", path.display()))?;
    let _ = fs::remove_file(&probe);
    Ok(())
}
