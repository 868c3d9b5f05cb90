//! `link`: make every tracked file on this machine a symlink into storage.

use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{FileOutcome, RunReport, Workspace, select_entries};
use crate::conflict::{ConflictAction, LinkConflict, resolve_link_conflict};
use crate::errors::{DotsyncError, with_rollback};
use crate::fs_ops::io_error_with_help;
use crate::prompt::Prompter;
use crate::shutdown;
use crate::symlink::{self, LinkStatus};

#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Only this entry.
    pub entry: Option<String>,
    /// Resolve every conflict with backup-and-link, without asking.
    pub auto_backup: bool,
}

/// Link all files of all (or one) entries. Per-file failures are recorded and
/// the run continues; an abort answer or an interrupt stops it.
pub fn link(ws: &Workspace, opts: &LinkOptions, prompter: &mut dyn Prompter) -> Result<RunReport> {
    let mut report = RunReport::default();
    let Some(manifest) = ws.load_manifest()? else {
        report.nothing_tracked = true;
        return Ok(report);
    };

    'entries: for (name, entry) in select_entries(&manifest, opts.entry.as_deref())? {
        for rel in &entry.files {
            if shutdown::is_requested() {
                report.interrupted = true;
                break 'entries;
            }
            let local = ws.link_path(entry, rel);
            let cloud = ws.storage().entry_file(name, rel);

            let outcome = match link_one(ws, &local, &cloud, opts.auto_backup, prompter) {
                Ok(o) => o,
                Err(e) => {
                    warn!(entry = name, file = %rel, error = %format!("{e:#}"), "link failed");
                    FileOutcome::Failed(format!("{e:#}"))
                }
            };
            let stop = outcome == FileOutcome::Aborted;
            report.push(name, rel, &local, outcome);
            if stop {
                info!(entry = name, file = %rel, "aborted by user");
                report.aborted = true;
                break 'entries;
            }
        }
    }
    Ok(report)
}

fn link_one(
    ws: &Workspace,
    local: &Path,
    cloud: &Path,
    auto_backup: bool,
    prompter: &mut dyn Prompter,
) -> Result<FileOutcome> {
    if fs::metadata(cloud).is_err() {
        return Err(DotsyncError::CloudSourceMissing(cloud.to_path_buf()).into());
    }

    let check = symlink::check(local, cloud)?;
    match check.status {
        LinkStatus::Linked => Ok(FileOutcome::AlreadyLinked),
        LinkStatus::NotExist => {
            symlink::create(local, cloud)?;
            info!(link = %local.display(), "linked");
            Ok(FileOutcome::Linked)
        }
        LinkStatus::Broken => {
            symlink::remove(local)?;
            symlink::create(local, cloud)?;
            info!(link = %local.display(), "replaced broken link");
            Ok(FileOutcome::Repaired)
        }
        LinkStatus::Incorrect | LinkStatus::NotLinked => {
            let conflict = LinkConflict {
                link: local.to_path_buf(),
                expected: cloud.to_path_buf(),
                status: check.status,
                actual_target: check.actual_target,
            };
            match resolve_link_conflict(auto_backup, prompter, &conflict)? {
                ConflictAction::Skip => Ok(FileOutcome::Skipped),
                ConflictAction::Abort => Ok(FileOutcome::Aborted),
                ConflictAction::Backup => replace(ws, conflict),
            }
        }
    }
}

/// Swap whatever occupies the link path for the expected symlink.
/// A plain file is snapshotted first and the snapshot kept; a wrong symlink is
/// only remembered, since removing it loses no data.
fn replace(ws: &Workspace, conflict: LinkConflict) -> Result<FileOutcome> {
    let LinkConflict { link, expected, actual_target, .. } = conflict;
    shutdown::check()?;

    if let Some(previous) = actual_target {
        symlink::remove(&link)?;
        if let Err(e) = symlink::create(&link, &expected) {
            let failures: Vec<_> = symlink::create(&link, &previous).err().into_iter().collect();
            return Err(with_rollback(e, failures));
        }
        info!(link = %link.display(), previous = %previous.display(), "relinked");
        return Ok(FileOutcome::Retargeted(previous));
    }

    let backup = ws.backups().create(&link)?;
    if let Err(e) = fs::remove_file(&link) {
        let failures: Vec<_> = backup.discard().err().into_iter().collect();
        return Err(with_rollback(io_error_with_help("remove existing file", &link)(e), failures));
    }
    if let Err(e) = symlink::create(&link, &expected) {
        let failures: Vec<_> = backup.restore().err().into_iter().collect();
        return Err(with_rollback(e, failures));
    }
    let kept = backup.keep();
    info!(link = %link.display(), backup = %kept.display(), "backed up and linked");
    Ok(FileOutcome::BackedUp(kept))
}
