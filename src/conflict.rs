//! Conflict resolution.
//!
//! Two questions are answered here:
//! - would tracking a path collide with an existing entry ([`check_entry_conflict`])?
//! - what to do when something already occupies a link location ([`resolve_link_conflict`])?
//!
//! Entries rooted at home itself (single dotfiles such as `~/.zshrc`) only claim
//! their listed files; they never own or overlap other paths.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::manifest::{Entry, Manifest};
use crate::pathutil::{Home, infer, join_slash};
use crate::prompt::Prompter;
use crate::symlink::LinkStatus;

fn owning_root(entry: &Entry, home: &Home) -> Option<PathBuf> {
    let root = home.expand(&entry.root);
    (root != home.dir()).then_some(root)
}

/// The entry whose root contains `path`; the most specific root wins.
pub fn owning_entry<'m>(path: &Path, manifest: &'m Manifest, home: &Home) -> Option<(&'m str, &'m Entry)> {
    manifest
        .entries
        .iter()
        .filter_map(|(name, e)| owning_root(e, home).map(|r| (name, e, r)))
        .filter(|(_, _, root)| path.starts_with(root))
        .max_by_key(|(_, _, root)| root.components().count())
        .map(|(name, e, _)| (name.as_str(), e))
}

/// The entry that already tracks exactly `path`, if any.
pub fn tracked_by<'m>(path: &Path, manifest: &'m Manifest, home: &Home) -> Option<&'m str> {
    manifest.entries.iter().find_map(|(name, e)| {
        let root = home.expand(&e.root);
        e.files
            .iter()
            .any(|f| join_slash(&root, f) == path)
            .then_some(name.as_str())
    })
}

fn strictly_below(a: &Path, b: &Path) -> bool {
    a != b && a.starts_with(b)
}

/// Name of the entry that adding `path` would collide with, if any.
///
/// - an explicit name that differs from the entry owning `path` conflicts with the owner
/// - a path already tracked conflicts with the tracking entry
/// - without an explicit name, an inferred root that is a strict ancestor or
///   descendant of an existing root conflicts with that entry
pub fn check_entry_conflict(
    path: &Path,
    explicit_name: Option<&str>,
    manifest: &Manifest,
    home: &Home,
) -> Option<String> {
    if let (Some(explicit), Some((owner, _))) = (explicit_name, owning_entry(path, manifest, home))
        && explicit != owner
    {
        return Some(owner.to_string());
    }

    if let Some(name) = tracked_by(path, manifest, home) {
        return Some(name.to_string());
    }

    if explicit_name.is_none()
        && let Some(inferred) = infer(path, home)
    {
        let inferred_root = home.expand(&inferred.root);
        if inferred_root == home.dir() {
            return None;
        }
        for (name, entry) in &manifest.entries {
            let Some(root) = owning_root(entry, home) else {
                continue;
            };
            if strictly_below(&inferred_root, &root) || strictly_below(&root, &inferred_root) {
                return Some(name.clone());
            }
        }
    }
    None
}

/// How to treat an occupied link location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Snapshot the occupant, remove it, then link.
    Backup,
    /// Leave this file alone.
    Skip,
    /// Stop the whole run.
    Abort,
}

impl ConflictAction {
    /// Unrecognized answers map to `Skip`, never to a destructive choice.
    pub fn from_response(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "b" | "backup" => ConflictAction::Backup,
            "a" | "abort" => ConflictAction::Abort,
            _ => ConflictAction::Skip,
        }
    }
}

/// Something other than the expected link sits at a link location.
#[derive(Debug, Clone)]
pub struct LinkConflict {
    pub link: PathBuf,
    pub expected: PathBuf,
    pub status: LinkStatus,
    pub actual_target: Option<PathBuf>,
}

impl LinkConflict {
    pub fn describe(&self) -> String {
        match (&self.status, &self.actual_target) {
            (LinkStatus::Incorrect, Some(t)) => format!(
                "{} is a symlink to {} (expected {})",
                self.link.display(),
                t.display(),
                self.expected.display()
            ),
            _ => format!("{} already exists and is not a symlink", self.link.display()),
        }
    }
}

/// Automatic mode always backs up; otherwise the user picks.
pub fn resolve_link_conflict(
    auto_backup: bool,
    prompter: &mut dyn Prompter,
    conflict: &LinkConflict,
) -> Result<ConflictAction> {
    if auto_backup {
        return Ok(ConflictAction::Backup);
    }
    let answer = prompter.ask(&format!(
        "{}\n  [b]ackup and link, [s]kip, [a]bort? ",
        conflict.describe()
    ))?;
    Ok(ConflictAction::from_response(&answer))
}
