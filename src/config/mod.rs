//! Machine-local configuration.
//! Types, default paths, XML load/save and validation. The config only says where
//! the synced folder lives on this machine plus logging/backup settings; the
//! manifest in storage is the shared state.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_backup_dir, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path, save_config};

/// Env var overriding the config file location.
pub const CONFIG_ENV: &str = "DOTSYNC_CONFIG";
