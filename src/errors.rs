//! Typed error definitions for dotsync.
//! Provides a small set of well-known failure modes for better logs and tests.
//!
//! Plain I/O failures are not listed here; they travel as `anyhow::Error`
//! enriched by `fs_ops::io_error_with_help`.

use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DotsyncError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("{reason}: {path}")]
    NotAllowed { path: PathBuf, reason: String },

    #[error("invalid entry name '{name}': {reason}")]
    InvalidEntryName { name: String, reason: &'static str },

    #[error("conflicts with entry '{entry}': {detail}")]
    Conflict { entry: String, detail: String },

    #[error("already tracked in entry '{entry}'")]
    AlreadyTracked { entry: String },

    #[error("file already exists in cloud storage: {0} (if syncing from another machine, use 'dotsync link' instead)")]
    DestinationExists(PathBuf),

    #[error("cloud copy missing: {0}")]
    CloudSourceMissing(PathBuf),

    #[error("not a symlink: {0}")]
    NotASymlink(PathBuf),

    #[error("storage unavailable: {0} (make sure your cloud storage is mounted and syncing)")]
    StorageUnavailable(PathBuf),

    #[error("dotsync not initialized; run 'dotsync init <provider>' first")]
    NotInitialized,

    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("manifest version {found} is newer than supported version {supported}; upgrade dotsync")]
    ManifestVersionTooNew { found: u32, supported: u32 },

    #[error("manifest rejected: {0}")]
    ManifestInvalid(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("aborted by user")]
    Aborted,

    #[error("operation interrupted by user")]
    Interrupted,

    #[error("{}", rollback_message(.cause, .failures))]
    RollbackFailed {
        cause: anyhow::Error,
        failures: Vec<anyhow::Error>,
    },
}

fn rollback_message(cause: &anyhow::Error, failures: &[anyhow::Error]) -> String {
    let mut msg = format!("{cause:#}; rollback also failed");
    for (i, f) in failures.iter().enumerate() {
        let _ = write!(msg, "\n  rollback step {}: {f:#}", i + 1);
    }
    msg
}

impl DotsyncError {
    /// Stable numeric code for structured logs and exit diagnostics.
    pub fn code(&self) -> u16 {
        match self {
            DotsyncError::NotFound(_) => 10,
            DotsyncError::NotAllowed { .. } => 20,
            DotsyncError::InvalidEntryName { .. } => 21,
            DotsyncError::Conflict { .. } => 30,
            DotsyncError::AlreadyTracked { .. } => 31,
            DotsyncError::DestinationExists(_) => 32,
            DotsyncError::CloudSourceMissing(_) => 40,
            DotsyncError::NotASymlink(_) => 41,
            DotsyncError::StorageUnavailable(_) => 50,
            DotsyncError::NotInitialized => 51,
            DotsyncError::ManifestNotFound(_) => 52,
            DotsyncError::ManifestVersionTooNew { .. } => 53,
            DotsyncError::EntryNotFound(_) => 54,
            DotsyncError::ManifestInvalid(_) => 55,
            DotsyncError::Aborted => 60,
            DotsyncError::Interrupted => 61,
            DotsyncError::RollbackFailed { .. } => 70,
        }
    }

    /// Short machine-readable label used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DotsyncError::NotFound(_) | DotsyncError::CloudSourceMissing(_) => "not_found",
            DotsyncError::NotAllowed { .. }
            | DotsyncError::InvalidEntryName { .. }
            | DotsyncError::NotASymlink(_) => "not_allowed",
            DotsyncError::Conflict { .. } | DotsyncError::DestinationExists(_) => "conflict",
            DotsyncError::AlreadyTracked { .. } => "already_tracked",
            DotsyncError::StorageUnavailable(_)
            | DotsyncError::NotInitialized
            | DotsyncError::ManifestNotFound(_)
            | DotsyncError::ManifestVersionTooNew { .. }
            | DotsyncError::ManifestInvalid(_)
            | DotsyncError::EntryNotFound(_) => "setup",
            DotsyncError::Aborted | DotsyncError::Interrupted => "aborted",
            DotsyncError::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

/// Wrap `cause` into a compound error if any rollback step failed.
pub(crate) fn with_rollback(cause: anyhow::Error, failures: Vec<anyhow::Error>) -> anyhow::Error {
    if failures.is_empty() {
        cause
    } else {
        DotsyncError::RollbackFailed { cause, failures }.into()
    }
}
