//! `unlink`: replace symlinks with plain local copies of the cloud files.
//! Storage and the manifest are left alone, so a later `link` restores the setup.

use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{FileOutcome, RunReport, Workspace, select_entries};
use crate::errors::{DotsyncError, with_rollback};
use crate::fs_ops::{copy_file, io_error_with_help};
use crate::shutdown;
use crate::symlink::{self, LinkStatus};

#[derive(Debug, Clone, Default)]
pub struct UnlinkOptions {
    /// Only this entry.
    pub entry: Option<String>,
}

pub fn unlink(ws: &Workspace, opts: &UnlinkOptions) -> Result<RunReport> {
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
            let outcome = unlink_one(&local, &cloud).unwrap_or_else(|e| {
                warn!(entry = name, file = %rel, error = %format!("{e:#}"), "unlink failed");
                FileOutcome::Failed(format!("{e:#}"))
            });
            report.push(name, rel, &local, outcome);
        }
    }
    Ok(report)
}

fn unlink_one(local: &Path, cloud: &Path) -> Result<FileOutcome> {
    let check = symlink::check(local, cloud)?;
    match check.status {
        LinkStatus::NotExist | LinkStatus::NotLinked => Ok(FileOutcome::NotLinked),
        LinkStatus::Broken => {
            symlink::remove(local)?;
            warn!(link = %local.display(), cloud = %cloud.display(), "removed broken link; cloud copy is missing");
            Ok(FileOutcome::RemovedBroken)
        }
        LinkStatus::Linked | LinkStatus::Incorrect => {
            if fs::metadata(cloud).is_err() {
                return Err(DotsyncError::CloudSourceMissing(cloud.to_path_buf()).into());
            }
            let previous = fs::read_link(local).map_err(io_error_with_help("read symlink", local))?;
            symlink::remove(local)?;
            if let Err(e) = copy_file(cloud, local) {
                let failures: Vec<_> = symlink::create(local, &previous).err().into_iter().collect();
                return Err(with_rollback(e, failures));
            }
            info!(path = %local.display(), "unlinked");
            Ok(FileOutcome::Unlinked)
        }
    }
}
