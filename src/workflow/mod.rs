//! Orchestrators for `add`, `link`, `unlink`, `list` and `init`.
//!
//! Each operation runs single-threaded against a [`Workspace`]. Multi-file runs
//! (link/unlink) keep going past per-file failures and return a [`RunReport`];
//! `add` is all-or-nothing and rolls back on any failure.

mod add;
mod init;
mod link;
mod status;
mod unlink;

pub use add::{AddOptions, AddOutcome, add};
pub use init::{InitOptions, InitOutcome, init};
pub use link::{LinkOptions, link};
pub use status::{EntryStatus, FileStatus, status};
pub use unlink::{UnlinkOptions, unlink};

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::backup::BackupManager;
use crate::config::Config;
use crate::errors::DotsyncError;
use crate::manifest::{Entry, Manifest};
use crate::pathutil::{Home, join_slash};
use crate::storage::Storage;

/// Everything a workflow needs to know about this machine.
#[derive(Debug, Clone)]
pub struct Workspace {
    home: Home,
    storage: Storage,
    backups: BackupManager,
}

impl Workspace {
    pub fn new(home: Home, storage: Storage, backups: BackupManager) -> Self {
        Self {
            home,
            storage,
            backups,
        }
    }

    /// Build from a loaded config. Fails with `NotInitialized` if no storage is set.
    pub fn from_config(cfg: &Config, home: Home) -> Result<Self> {
        let storage = Storage::new(cfg.storage_root(&home)?);
        let backups = BackupManager::new(cfg.resolved_backup_dir()?);
        Ok(Self::new(home, storage, backups))
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// The manifest, or None when storage holds none yet.
    pub fn load_manifest(&self) -> Result<Option<Manifest>> {
        self.storage.ensure_available()?;
        match Manifest::load(&self.storage.manifest_path()) {
            Ok(m) => Ok(Some(m)),
            Err(e) if matches!(e.downcast_ref::<DotsyncError>(), Some(DotsyncError::ManifestNotFound(_))) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Local path where `rel_path` of `entry` is expected as a symlink.
    pub fn link_path(&self, entry: &Entry, rel_path: &str) -> PathBuf {
        join_slash(&self.home.expand(&entry.root), rel_path)
    }
}

/// Entries to visit, in name order, optionally narrowed to one.
pub(crate) fn select_entries<'m>(
    manifest: &'m Manifest,
    only: Option<&str>,
) -> Result<Vec<(&'m str, &'m Entry)>> {
    match only {
        Some(name) => {
            let (key, entry) = manifest
                .entries
                .get_key_value(name)
                .ok_or_else(|| DotsyncError::EntryNotFound(name.to_string()))?;
            Ok(vec![(key.as_str(), entry)])
        }
        None => Ok(manifest.entries.iter().map(|(n, e)| (n.as_str(), e)).collect()),
    }
}

/// What happened to one file during a link or unlink run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Symlink created where nothing was.
    Linked,
    /// Already pointing at the cloud copy.
    AlreadyLinked,
    /// Broken symlink replaced.
    Repaired,
    /// Plain file snapshotted to the given backup, then replaced by the link.
    BackedUp(PathBuf),
    /// Symlink that pointed elsewhere (the given target) replaced.
    Retargeted(PathBuf),
    /// Symlink replaced by a local copy of the cloud file.
    Unlinked,
    /// Stale symlink removed; there was no cloud copy to bring back.
    RemovedBroken,
    /// Nothing to unlink.
    NotLinked,
    Skipped,
    /// The user chose abort on this file.
    Aborted,
    Failed(String),
}

impl FileOutcome {
    pub fn tag(&self) -> &'static str {
        match self {
            FileOutcome::Linked => "linked",
            FileOutcome::AlreadyLinked => "ok",
            FileOutcome::Repaired => "repaired",
            FileOutcome::BackedUp(_) => "backed up",
            FileOutcome::Retargeted(_) => "relinked",
            FileOutcome::Unlinked => "unlinked",
            FileOutcome::RemovedBroken => "removed",
            FileOutcome::NotLinked => "skip",
            FileOutcome::Skipped => "skipped",
            FileOutcome::Aborted => "aborted",
            FileOutcome::Failed(_) => "failed",
        }
    }

    fn is_change(&self) -> bool {
        matches!(
            self,
            FileOutcome::Linked
                | FileOutcome::Repaired
                | FileOutcome::BackedUp(_)
                | FileOutcome::Retargeted(_)
                | FileOutcome::Unlinked
                | FileOutcome::RemovedBroken
        )
    }
}

/// One processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub entry: String,
    pub rel_path: String,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Counts shown at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    /// Stopped early by an explicit abort answer.
    pub aborted: bool,
    /// Stopped early by an interrupt signal.
    pub interrupted: bool,
    /// No manifest in storage.
    pub nothing_tracked: bool,
}

impl RunReport {
    pub(crate) fn push(&mut self, entry: &str, rel_path: &str, path: &Path, outcome: FileOutcome) {
        self.files.push(FileReport {
            entry: entry.to_string(),
            rel_path: rel_path.to_string(),
            path: path.to_path_buf(),
            outcome,
        });
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary::default();
        for f in &self.files {
            match &f.outcome {
                o if o.is_change() => s.changed += 1,
                FileOutcome::AlreadyLinked | FileOutcome::NotLinked => s.unchanged += 1,
                FileOutcome::Skipped | FileOutcome::Aborted => s.skipped += 1,
                FileOutcome::Failed(_) => s.failed += 1,
                _ => {}
            }
        }
        s
    }

    /// True unless a file failed or the run stopped early.
    pub fn is_success(&self) -> bool {
        !self.aborted && !self.interrupted && self.summary().failed == 0
    }

    pub fn outcome_of(&self, entry: &str, rel_path: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.entry == entry && f.rel_path == rel_path)
            .map(|f| &f.outcome)
    }
}
