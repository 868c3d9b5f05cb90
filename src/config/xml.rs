//! XML configuration support.
//! - Reads config.xml with quick_xml + serde; unknown elements are an error.
//! - Writes it back atomically with owner-only permissions.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::paths::path_has_symlink_ancestor;
use super::types::{Config, LogLevel};
use crate::platform::{atomic_write, set_dir_mode_0700};

/// Struct mirroring the XML config for (de)serialization.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backup_dir: Option<String>,
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config {
        storage_path: trimmed(parsed.storage_path),
        log_file: trimmed(parsed.log_file).map(PathBuf::from),
        backup_dir: trimmed(parsed.backup_dir).map(PathBuf::from),
        ..Default::default()
    };
    if let Some(s) = trimmed(parsed.log_level) {
        match s.parse::<LogLevel>() {
            Ok(level) => cfg.log_level = level,
            Err(e) => warn!("{e}; using '{}'", cfg.log_level),
        }
    }
    cfg
}

fn config_to_xml(cfg: &Config) -> XmlConfig {
    XmlConfig {
        storage_path: cfg.storage_path.clone(),
        log_level: Some(cfg.log_level.to_string()),
        log_file: cfg.log_file.as_ref().map(|p| p.display().to_string()),
        backup_dir: cfg.backup_dir.as_ref().map(|p| p.display().to_string()),
    }
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(xml_to_config(parsed))
}

/// Load the config at `path`; Ok(None) when the file does not exist.
pub fn load_config(path: &Path) -> Result<Option<Config>> {
    match fs::metadata(path) {
        Ok(_) => load_config_from_xml_path(path).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("stat config '{}'", path.display())),
    }
}

/// Write `cfg` to `path` (temp + rename, mode 0600).
/// Refuses to write through a symlinked ancestor directory.
pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)
        .with_context(|| format!("check config path '{}'", path.display()))?
    {
        bail!(
            "Refusing to write config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        let existed = parent.exists();
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
        if !existed {
            let _ = set_dir_mode_0700(parent);
        }
    }

    let body = quick_xml::se::to_string(&config_to_xml(cfg)).context("serialize config")?;
    let content = format!(
        "<!--\n  dotsync configuration (machine-local)\n\n    storage_path -> synced folder, ~ allowed\n    log_level    -> quiet | normal | info | debug\n    log_file     -> optional log file path\n    backup_dir   -> where conflict snapshots are kept\n-->\n{body}\n"
    );
    atomic_write(path, content.as_bytes(), 0o600)?;
    info!(path = %path.display(), "saved config");
    Ok(())
}
