//! `list`: link status of every tracked file.

use anyhow::Result;
use std::path::PathBuf;

use super::Workspace;
use crate::symlink::{self, LinkStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub rel_path: String,
    pub path: PathBuf,
    pub status: LinkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub name: String,
    pub root: String,
    pub files: Vec<FileStatus>,
}

impl EntryStatus {
    fn count(&self, status: LinkStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// "all linked", "not linked", or the per-status breakdown.
    /// A missing local file counts as not linked.
    pub fn summary(&self) -> String {
        let linked = self.count(LinkStatus::Linked);
        let not_linked = self.count(LinkStatus::NotLinked) + self.count(LinkStatus::NotExist);
        let broken = self.count(LinkStatus::Broken);
        let incorrect = self.count(LinkStatus::Incorrect);

        if self.files.is_empty() {
            "no files".to_string()
        } else if linked == self.files.len() {
            "all linked".to_string()
        } else if not_linked == self.files.len() {
            "not linked".to_string()
        } else {
            format!("{linked} linked, {not_linked} not linked, {broken} broken, {incorrect} incorrect")
        }
    }
}

/// Status of all entries in name order; None when nothing is tracked.
pub fn status(ws: &Workspace) -> Result<Option<Vec<EntryStatus>>> {
    let Some(manifest) = ws.load_manifest()? else {
        return Ok(None);
    };
    let mut out = Vec::with_capacity(manifest.entries.len());
    for (name, entry) in &manifest.entries {
        let mut files = Vec::with_capacity(entry.files.len());
        for rel in &entry.files {
            let path = ws.link_path(entry, rel);
            let check = symlink::check(&path, &ws.storage().entry_file(name, rel))?;
            files.push(FileStatus {
                rel_path: rel.clone(),
                path,
                status: check.status,
            });
        }
        out.push(EntryStatus {
            name: name.clone(),
            root: entry.root.clone(),
            files,
        });
    }
    Ok(Some(out))
}
