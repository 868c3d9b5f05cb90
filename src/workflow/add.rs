//! `add`: move one local file into storage and leave a symlink behind.
//!
//! Steps: validate, resolve placement, check conflicts, snapshot, move, link,
//! persist the manifest. A failure after the snapshot unwinds every completed
//! step so the file ends up at exactly one place: its original location.

use anyhow::{Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Workspace;
use crate::backup::Backup;
use crate::conflict::{check_entry_conflict, owning_entry, tracked_by};
use crate::errors::{DotsyncError, with_rollback};
use crate::fs_ops::{first_missing_dir, io_error_with_help, move_file, remove_created_dirs};
use crate::manifest::Manifest;
use crate::pathutil::{Home, Validation, clean, infer, to_slash, validate_entry_name, validate_for_add};
use crate::prompt::{Prompter, confirm};
use crate::{shutdown, symlink};

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Entry name given on the command line.
    pub name: Option<String>,
    /// Answer yes to warnings instead of asking.
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added {
        entry: String,
        root: String,
        rel_path: String,
        stored_at: PathBuf,
    },
    /// The file was already tracked; nothing changed.
    AlreadyTracked { entry: String },
}

/// Seams for the move and the two steps after it, so tests can make them fail.
pub(crate) struct Steps {
    pub relocate: fn(&Path, &Path) -> Result<()>,
    pub link: fn(&Path, &Path) -> Result<()>,
    pub save: fn(&Manifest, &Path) -> Result<()>,
}

fn save_manifest(m: &Manifest, path: &Path) -> Result<()> {
    m.save(path)
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            relocate: move_file,
            link: symlink::create,
            save: save_manifest,
        }
    }
}

/// Track `path` (absolute) in storage.
pub fn add(ws: &Workspace, path: &Path, opts: &AddOptions, prompter: &mut dyn Prompter) -> Result<AddOutcome> {
    add_with(ws, path, opts, prompter, &Steps::default())
}

pub(crate) fn add_with(
    ws: &Workspace,
    path: &Path,
    opts: &AddOptions,
    prompter: &mut dyn Prompter,
    steps: &Steps,
) -> Result<AddOutcome> {
    let path = clean(path);
    let home = ws.home();

    match validate_for_add(&path, home)? {
        Validation::Ok => {}
        Validation::Fatal(e) => return Err(e.into()),
        Validation::Warn(msg) => {
            if opts.assume_yes {
                warn!(path = %path.display(), "{msg}");
            } else if !confirm(prompter, &format!("{msg}. Continue?"))? {
                return Err(DotsyncError::Aborted.into());
            }
        }
    }

    ws.storage().ensure_available()?;
    let manifest_path = ws.storage().manifest_path();
    let manifest = Manifest::load_or_default(&manifest_path)?;

    if let Some(entry) = tracked_by(&path, &manifest, home) {
        info!(path = %path.display(), entry, "already tracked");
        return Ok(AddOutcome::AlreadyTracked {
            entry: entry.to_string(),
        });
    }

    if let Some(name) = &opts.name {
        validate_entry_name(name)?;
    }
    if let Some(other) = check_entry_conflict(&path, opts.name.as_deref(), &manifest, home) {
        return Err(conflict_for(&path, other, home).into());
    }

    let place = resolve_placement(&path, opts.name.as_deref(), &manifest, home, prompter)?;
    let dest = ws.storage().entry_file(&place.name, &place.rel_path);
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(DotsyncError::DestinationExists(dest).into());
    }
    debug!(entry = %place.name, root = %place.root, rel = %place.rel_path, dest = %dest.display(), "resolved placement");

    shutdown::check()?;
    let backup = ws.backups().create(&path)?;
    let created = dest.parent().and_then(first_missing_dir);
    let unwind = |cause: anyhow::Error, failures: Vec<anyhow::Error>| {
        prune_created(&dest, created.as_deref());
        with_rollback(cause, failures)
    };

    if let Err(e) = (steps.relocate)(&path, &dest) {
        return Err(unwind(e, restore_all(backup)));
    }

    if shutdown::is_requested() {
        let failures = move_back(&dest, &path, backup);
        return Err(unwind(DotsyncError::Interrupted.into(), failures));
    }

    if let Err(e) = (steps.link)(&path, &dest) {
        let failures = move_back(&dest, &path, backup);
        return Err(unwind(e, failures));
    }

    let mut updated = manifest;
    updated.add_file(&place.name, &place.root, &place.rel_path);
    if let Err(e) = (steps.save)(&updated, &manifest_path) {
        let failures = move_back(&dest, &path, backup);
        return Err(unwind(e, failures));
    }

    if let Err(e) = backup.discard() {
        warn!(error = %format!("{e:#}"), "added, but could not remove the temporary backup");
    }
    info!(path = %path.display(), entry = %place.name, dest = %dest.display(), "added");
    Ok(AddOutcome::Added {
        entry: place.name,
        root: place.root,
        rel_path: place.rel_path,
        stored_at: dest,
    })
}

/// Drop storage directories this add created, once the stored copy is gone.
fn prune_created(dest: &Path, created: Option<&Path>) {
    if let (Some(top), Some(parent)) = (created, dest.parent())
        && fs::symlink_metadata(dest).is_err()
    {
        remove_created_dirs(parent, top);
    }
}

fn restore_all(backup: Backup) -> Vec<anyhow::Error> {
    match backup.restore() {
        Ok(()) => Vec::new(),
        Err(e) => vec![e],
    }
}

/// Undo a completed move. If the file cannot be moved back, the snapshot is put
/// at the original path and the stored copy dropped, so it still lives in one place.
fn move_back(dest: &Path, original: &Path, backup: Backup) -> Vec<anyhow::Error> {
    let mut failures = Vec::new();
    if let Err(e) = symlink::remove(original) {
        failures.push(e.context("remove new symlink"));
    }
    match move_file(dest, original) {
        Ok(()) => failures.extend(restore_all(backup)),
        Err(e) => {
            failures.push(e.context("move file back from storage"));
            match backup.restore() {
                Ok(()) => {
                    if let Err(e) = fs::remove_file(dest) {
                        failures.push(io_error_with_help("remove stored copy", dest)(e));
                    }
                }
                Err(e) => failures.push(e),
            }
        }
    }
    failures
}

fn conflict_for(path: &Path, other: String, home: &Home) -> DotsyncError {
    DotsyncError::Conflict {
        detail: format!(
            "{} overlaps entry '{other}'; use --name {other} to add it there",
            home.contract(path)
        ),
        entry: other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    name: String,
    root: String,
    rel_path: String,
}

fn resolve_placement(
    path: &Path,
    explicit: Option<&str>,
    manifest: &Manifest,
    home: &Home,
    prompter: &mut dyn Prompter,
) -> Result<Placement> {
    if let Some(name) = explicit {
        return place_named(path, name, manifest, home);
    }

    if let Some((name, entry)) = owning_entry(path, manifest, home) {
        let root = home.expand(&entry.root);
        return Ok(Placement {
            name: name.to_string(),
            root: entry.root.clone(),
            rel_path: rel_under(path, &root)?,
        });
    }

    if let Some(inferred) = infer(path, home) {
        validate_entry_name(&inferred.name)?;
        if let Some(existing) = manifest.get_entry(&inferred.name)
            && home.expand(&existing.root) != home.expand(&inferred.root)
        {
            return Err(DotsyncError::Conflict {
                detail: format!(
                    "exists with different root {} (inferred {})",
                    existing.root, inferred.root
                ),
                entry: inferred.name,
            }
            .into());
        }
        return Ok(Placement {
            name: inferred.name,
            root: inferred.root,
            rel_path: inferred.rel_path,
        });
    }

    let answer = prompter.ask(&format!(
        "Could not infer an entry name for {}.\nEntry name (empty to abort): ",
        home.contract(path)
    ))?;
    if answer.is_empty() {
        return Err(DotsyncError::Aborted.into());
    }
    validate_entry_name(&answer)?;
    if let Some(other) = check_entry_conflict(path, Some(&answer), manifest, home) {
        return Err(conflict_for(path, other, home).into());
    }
    place_named(path, &answer, manifest, home)
}

/// Placement under an explicitly chosen name.
fn place_named(path: &Path, name: &str, manifest: &Manifest, home: &Home) -> Result<Placement> {
    if let Some(entry) = manifest.get_entry(name) {
        let root = home.expand(&entry.root);
        if !path.starts_with(&root) || path == root {
            return Err(DotsyncError::Conflict {
                entry: name.to_string(),
                detail: format!(
                    "{} is not under existing entry root {}",
                    home.contract(path),
                    entry.root
                ),
            }
            .into());
        }
        return Ok(Placement {
            name: name.to_string(),
            root: entry.root.clone(),
            rel_path: rel_under(path, &root)?,
        });
    }

    if let Some(inferred) = infer(path, home) {
        return Ok(Placement {
            name: name.to_string(),
            root: inferred.root,
            rel_path: inferred.rel_path,
        });
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path has no parent directory: {}", path.display()))?;
    Ok(Placement {
        name: name.to_string(),
        root: home.contract(parent),
        rel_path: rel_under(path, parent)?,
    })
}

fn rel_under(path: &Path, root: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| anyhow!("{} is not under {}", path.display(), root.display()))?;
    Ok(to_slash(rel))
}
