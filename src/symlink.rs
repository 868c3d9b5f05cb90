//! Link state checker and symlink primitives.
//!
//! [`check`] classifies one (link path, expected target) pair into a [`LinkStatus`].
//! Nothing is cached; every call inspects the filesystem again.

use anyhow::Result;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::DotsyncError;
use crate::fs_ops::io_error_with_help;
use crate::pathutil::clean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Nothing at the link path.
    NotExist,
    /// A regular file or directory occupies the link path.
    NotLinked,
    /// A symlink whose reachable target is the expected one.
    Linked,
    /// A symlink whose target cannot be reached.
    Broken,
    /// A symlink whose reachable target is something else.
    Incorrect,
}

impl LinkStatus {
    pub const ALL: [LinkStatus; 5] = [
        LinkStatus::NotExist,
        LinkStatus::NotLinked,
        LinkStatus::Linked,
        LinkStatus::Broken,
        LinkStatus::Incorrect,
    ];

    /// Short bracketed tag used in per-file listings.
    pub fn tag(self) -> &'static str {
        match self {
            LinkStatus::NotExist => "[missing]",
            LinkStatus::NotLinked => "[not lnk]",
            LinkStatus::Linked => "[ok]",
            LinkStatus::Broken => "[broken]",
            LinkStatus::Incorrect => "[wrong]",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStatus::NotExist => "not exist",
            LinkStatus::NotLinked => "not linked",
            LinkStatus::Linked => "linked",
            LinkStatus::Broken => "broken",
            LinkStatus::Incorrect => "incorrect",
        };
        f.write_str(s)
    }
}

/// Result of a check: the status plus the literal target read from the link, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheck {
    pub status: LinkStatus,
    pub actual_target: Option<PathBuf>,
}

impl LinkCheck {
    fn plain(status: LinkStatus) -> Self {
        Self {
            status,
            actual_target: None,
        }
    }
}

/// Classify `link` against `expected`. Reachability is decided before equality:
/// a link to the right path whose file vanished is `Broken`, not `Incorrect`.
pub fn check(link: &Path, expected: &Path) -> Result<LinkCheck> {
    let meta = match fs::symlink_metadata(link) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(LinkCheck::plain(LinkStatus::NotExist));
        }
        Err(e) => return Err(io_error_with_help("inspect link path", link)(e)),
    };
    if !meta.file_type().is_symlink() {
        return Ok(LinkCheck::plain(LinkStatus::NotLinked));
    }

    let target = fs::read_link(link).map_err(io_error_with_help("read symlink", link))?;
    let status = match fs::metadata(link) {
        Ok(_) if points_to(link, &target, expected) => LinkStatus::Linked,
        Ok(_) => LinkStatus::Incorrect,
        Err(e) if is_unreachable(&e) => LinkStatus::Broken,
        // Permission errors and the like say nothing about the link itself.
        Err(e) => return Err(io_error_with_help("inspect link target", link)(e)),
    };
    Ok(LinkCheck {
        status,
        actual_target: Some(target),
    })
}

/// The target is gone, sits under a non-directory, or the link chain loops.
fn is_unreachable(e: &io::Error) -> bool {
    if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) {
        return true;
    }
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::ELOOP) {
        return true;
    }
    false
}

/// Absolute, lexically cleaned target of a link; relative targets resolve against
/// the directory that contains the link.
pub fn resolve_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        clean(target)
    } else {
        let base = link.parent().unwrap_or_else(|| Path::new(""));
        clean(&base.join(target))
    }
}

fn points_to(link: &Path, target: &Path, expected: &Path) -> bool {
    if resolve_target(link, target) == clean(expected) {
        return true;
    }
    // Same file reached through a symlinked ancestor (e.g. /var -> /private/var).
    match (dunce::canonicalize(link), dunce::canonicalize(expected)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create `link` pointing at `target`, creating `link`'s parent directories.
pub fn create(link: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).map_err(io_error_with_help("create link directory", parent))?;
    }
    platform_symlink(target, link).map_err(io_error_with_help("create symlink", link))?;
    debug!(link = %link.display(), target = %target.display(), "created symlink");
    Ok(())
}

/// Remove the symlink at `link`. Missing is fine; anything that is not a symlink is refused.
pub fn remove(link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error_with_help("inspect link path", link)(e)),
        Ok(m) if !m.file_type().is_symlink() => {
            Err(DotsyncError::NotASymlink(link.to_path_buf()).into())
        }
        Ok(_) => {
            fs::remove_file(link).map_err(io_error_with_help("remove symlink", link))?;
            debug!(link = %link.display(), "removed symlink");
            Ok(())
        }
    }
}

#[cfg(unix)]
fn platform_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn platform_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
