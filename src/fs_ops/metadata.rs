//! Metadata carried across copies.
//! - Permission bits are part of the contract: failing to apply them is an error.
//! - Timestamps (atime, mtime) are best-effort; failures are logged and ignored.

use anyhow::Result;
use filetime::{FileTime, set_file_times};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

use super::helpers::io_error_with_help;

/// Apply `src_meta`'s permissions and timestamps to `dest`.
pub fn apply_metadata(dest: &Path, src_meta: &fs::Metadata) -> Result<()> {
    let at = FileTime::from_last_access_time(src_meta);
    let mt = FileTime::from_last_modification_time(src_meta);
    match set_file_times(dest, at, mt) {
        Ok(()) => trace!(path = %dest.display(), "set atime/mtime"),
        Err(e) => warn!(path = %dest.display(), error = %e, "failed to set atime/mtime"),
    }

    // Windows only has the readonly flag; Permissions carries it either way.
    fs::set_permissions(dest, src_meta.permissions())
        .map_err(io_error_with_help("set permissions", dest))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        trace!(path = %dest.display(), mode = format!("{:o}", src_meta.permissions().mode() & 0o7777), "set permissions");
    }
    Ok(())
}
