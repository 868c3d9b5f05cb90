//! Manifest: the persisted map of entry name -> {root, files}.
//!
//! Stored as pretty JSON at `<storage>/dotsync/.dotsync.json` and shared by every
//! machine through the synced folder. Entries are kept in a `BTreeMap` so they are
//! always visited in name order; `files` keeps insertion order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::errors::DotsyncError;
use crate::fs_ops::io_error_with_help;
use crate::pathutil::validate_entry_name;
use crate::platform::atomic_write;

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = ".dotsync.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Portable root, usually `~/...`.
    pub root: String,
    /// `/`-separated paths relative to `root`.
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file is the typed `ManifestNotFound`; a file
    /// written by a newer dotsync is refused before its shape is interpreted.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DotsyncError::ManifestNotFound(path.to_path_buf()).into());
            }
            Err(e) => return Err(io_error_with_help("read manifest", path)(e)),
        };

        let probe: VersionProbe = serde_json::from_str(&data)
            .with_context(|| format!("parse manifest '{}'", path.display()))?;
        if probe.version > MANIFEST_VERSION {
            return Err(DotsyncError::ManifestVersionTooNew {
                found: probe.version,
                supported: MANIFEST_VERSION,
            }
            .into());
        }

        let mut m: Manifest = serde_json::from_str(&data)
            .with_context(|| format!("parse manifest '{}'", path.display()))?;
        if m.version == 0 {
            m.version = MANIFEST_VERSION;
        }
        m.check()?;
        debug!(path = %path.display(), entries = m.entries.len(), "loaded manifest");
        Ok(m)
    }

    /// Like [`Manifest::load`], but a missing file yields an empty manifest.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(m) => Ok(m),
            Err(e) if matches!(e.downcast_ref::<DotsyncError>(), Some(DotsyncError::ManifestNotFound(_))) => {
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Write atomically (temp sibling + rename) so a crash never leaves half a manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(self).context("serialize manifest")?;
        data.push(b'\n');
        atomic_write(path, &data, 0o644)
            .with_context(|| format!("save manifest '{}'", path.display()))?;
        debug!(path = %path.display(), entries = self.entries.len(), "saved manifest");
        Ok(())
    }

    /// Refuse entries that would place files outside their root or storage.
    /// The manifest arrives from other machines, so nothing in it is trusted.
    pub fn check(&self) -> Result<(), DotsyncError> {
        for (name, entry) in &self.entries {
            validate_entry_name(name).map_err(|e| DotsyncError::ManifestInvalid(e.to_string()))?;
            for rel in &entry.files {
                if let Some(reason) = bad_rel_path(rel) {
                    return Err(DotsyncError::ManifestInvalid(format!(
                        "entry '{name}' lists '{rel}': {reason}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get_entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `rel_path` under entry `name`, creating the entry with `root` if needed.
    /// Returns false when the file was already listed.
    pub fn add_file(&mut self, name: &str, root: &str, rel_path: &str) -> bool {
        let entry = self.entries.entry(name.to_string()).or_insert_with(|| Entry {
            root: root.to_string(),
            files: Vec::new(),
        });
        if entry.files.iter().any(|f| f == rel_path) {
            return false;
        }
        entry.files.push(rel_path.to_string());
        true
    }
}

fn bad_rel_path(rel: &str) -> Option<&'static str> {
    if rel.split('/').all(|p| p.is_empty() || p == ".") {
        return Some("path is empty");
    }
    if rel.starts_with('/') || rel.contains('\\') || Path::new(rel).is_absolute() {
        return Some("path is not relative");
    }
    if rel.split('/').any(|p| p == "..") {
        return Some("path leaves its root");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_file_creates_entry_and_ignores_duplicates() {
        let mut m = Manifest::new();
        assert!(m.add_file("opencode", "~/.config/opencode", "config.json"));
        assert!(m.add_file("opencode", "~/.config/other", "agents/review.md"));
        assert!(!m.add_file("opencode", "~/.config/opencode", "config.json"));
        let e = m.get_entry("opencode").unwrap();
        assert_eq!(e.root, "~/.config/opencode");
        assert_eq!(e.files, vec!["config.json", "agents/review.md"]);
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dotsync").join(MANIFEST_FILE);
        let mut m = Manifest::new();
        m.add_file("zsh", "~", ".zshrc");
        m.add_file("aws", "~/.aws", "config");
        m.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\": 1"), "{text}");
        assert_eq!(Manifest::load(&path).unwrap(), m);
        let names: Vec<&String> = m.entries.keys().collect();
        assert_eq!(names, ["aws", "zsh"]);
    }

    #[test]
    fn missing_manifest_is_typed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DotsyncError>(),
            Some(DotsyncError::ManifestNotFound(_))
        ));
        assert!(Manifest::load_or_default(&path).unwrap().is_empty());
    }

    #[test]
    fn newer_version_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, r#"{"version": 7, "entries": {"x": "new-shape"}}"#).unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DotsyncError>(),
            Some(DotsyncError::ManifestVersionTooNew { found: 7, supported: 1 })
        ));
    }

    #[test]
    fn escaping_paths_are_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        for bad in [
            r#"{"version":1,"entries":{"app":{"root":"~/.app","files":["../../.bashrc"]}}}"#,
            r#"{"version":1,"entries":{"app":{"root":"~/.app","files":["/etc/passwd"]}}}"#,
            r#"{"version":1,"entries":{"app":{"root":"~/.app","files":[""]}}}"#,
            r#"{"version":1,"entries":{"..":{"root":"~","files":[".zshrc"]}}}"#,
            r#"{"version":1,"entries":{"a/b":{"root":"~","files":[".zshrc"]}}}"#,
        ] {
            fs::write(&path, bad).unwrap();
            let err = Manifest::load(&path).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<DotsyncError>(), Some(DotsyncError::ManifestInvalid(_))),
                "{bad}: {err:#}"
            );
        }

        fs::write(
            &path,
            r#"{"version":1,"entries":{"nvim":{"root":"~/.config/nvim","files":["lua/./init.lua"]}}}"#,
        )
        .unwrap();
        assert!(Manifest::load(&path).is_ok());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(Manifest::load(&path).is_err());
        assert!(Manifest::load_or_default(&path).is_err());
    }
}
