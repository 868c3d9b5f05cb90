//! I/O error enrichment.
//!
//! `io_error_with_help(op, path)` returns a closure for `.map_err(...)` that turns an
//! `io::Error` into an `anyhow::Error` carrying the operation, the path, a hint keyed
//! on the OS error code, and the raw code itself.
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for_code(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        let hint = match code {
            libc::EACCES | libc::EPERM => "permission denied; check ownership and write permissions",
            libc::EXDEV => "cross-filesystem; atomic rename not possible",
            libc::EBUSY => "resource busy; ensure no other process is using it",
            libc::ENOENT => "path not found; verify it exists",
            libc::EEXIST => "already exists; remove the target first",
            libc::ENOSPC => "no space left on device",
            libc::EROFS => "read-only filesystem; cannot write here",
            libc::ELOOP => "too many levels of symbolic links; possible symlink cycle",
            libc::ENAMETOOLONG => "file name or path too long",
            libc::ENOTDIR => "a parent component is not a directory",
            _ => return None,
        };
        Some(hint)
    }
    #[cfg(windows)]
    {
        let hint = match code {
            5 => "access denied; check permissions",
            17 => "not same device; cross-filesystem move",
            32 => "sharing violation; file is in use",
            2 | 3 => "path not found; verify it exists",
            80 | 183 => "already exists; remove the target first",
            112 => "insufficient disk space",
            // ERROR_PRIVILEGE_NOT_HELD
            1314 => {
                "creating symlinks requires Developer Mode or an elevated prompt (Settings > For developers)"
            }
            _ => return None,
        };
        Some(hint)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; remove the target first"),
        _ => None,
    }
}

/// Human-friendly message: op, path, error, hint, OS code.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(h) = hint_for_code(code) {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if let Some(h) = hint_for_kind(e.kind()) {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
        }
    }
    msg
}

/// Adapter for `anyhow::Result` code paths.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}
