//! Core library for `dotsync`.
//!
//! dotsync keeps configuration files in a cloud-synced folder and leaves a symlink
//! at each original location, so every machine sharing the folder sees the same files.
//!
//! Layers, bottom-up:
//! - `pathutil`: home context, entry inference, add-time validation
//! - `fs_ops`, `platform`: atomic moves/copies and OS specifics
//! - `backup`, `symlink`, `manifest`, `storage`: the building blocks
//! - `conflict`, `prompt`: decisions, with terminal I/O kept behind a trait
//! - `workflow`: add, link, unlink, list and init

pub mod backup;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod errors;
pub mod fs_ops;
pub mod manifest;
pub mod output;
pub mod pathutil;
pub mod platform;
pub mod prompt;
pub mod shutdown;
pub mod storage;
pub mod symlink;
pub mod workflow;

pub use config::{Config, LogLevel, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use errors::DotsyncError;

/// Common imports for callers driving the workflows directly.
pub mod prelude {
    pub use crate::backup::{Backup, BackupManager};
    pub use crate::config::{Config, LogLevel};
    pub use crate::conflict::{ConflictAction, LinkConflict};
    pub use crate::errors::DotsyncError;
    pub use crate::manifest::{Entry, Manifest};
    pub use crate::pathutil::{Home, InferResult, infer};
    pub use crate::prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
    pub use crate::storage::{Provider, Storage};
    pub use crate::symlink::LinkStatus;
    pub use crate::workflow::{
        AddOptions, AddOutcome, FileOutcome, InitOptions, LinkOptions, RunReport, UnlinkOptions, Workspace,
    };
}
