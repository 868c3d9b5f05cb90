//! Safe copy-and-rename:
//! - copy into a hidden temp file in the destination directory
//! - apply the source's permissions and timestamps to the temp file
//! - atomically rename temp -> dest, so a partial copy is never visible at dest
//!
//! The rename replaces whatever is at `dest`, including a symlink (the link is
//! replaced, never written through).

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

use super::atomic::try_atomic_move;
use super::helpers::io_error_with_help;
use super::{io_copy, metadata};
use crate::platform::tmp_sibling_name;

pub fn safe_copy_and_rename(src: &Path, dest: &Path) -> Result<()> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| anyhow!("destination has no parent: {}", dest.display()))?;
    fs::create_dir_all(dest_dir)
        .map_err(io_error_with_help("create destination directory", dest_dir))?;

    let src_meta = fs::metadata(src).map_err(io_error_with_help("stat source", src))?;
    let tmp = tmp_sibling_name(dest);

    let staged = io_copy::copy_streaming(src, &tmp)
        .map_err(io_error_with_help("copy to temporary file", &tmp))
        .and_then(|_| metadata::apply_metadata(&tmp, &src_meta));
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = try_atomic_move(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("install copy at '{}'", dest.display()));
    }
    Ok(())
}
