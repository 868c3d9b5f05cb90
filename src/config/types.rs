//! Core configuration types.
//! - Config holds this machine's settings.
//! - LogLevel represents verbosity with simple parsing helpers.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use crate::errors::DotsyncError;
use crate::pathutil::Home;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Progress of each step
    Info,
    /// Everything
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Settings for this machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Synced folder in portable form (`~/Dropbox`); None until `init` ran.
    pub storage_path: Option<String>,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Where link-conflict snapshots go; defaults under the cache dir.
    pub backup_dir: Option<PathBuf>,
}

impl Config {
    pub fn with_storage(storage_path: impl Into<String>) -> Self {
        Self {
            storage_path: Some(storage_path.into()),
            ..Default::default()
        }
    }

    /// Absolute storage root for this machine, or `NotInitialized`.
    pub fn storage_root(&self, home: &Home) -> Result<PathBuf> {
        match self.storage_path.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(home.expand(s)),
            _ => Err(DotsyncError::NotInitialized.into()),
        }
    }

    pub fn resolved_backup_dir(&self) -> Result<PathBuf> {
        match &self.backup_dir {
            Some(p) => Ok(p.clone()),
            None => paths::default_backup_dir(),
        }
    }
}
