//! Filesystem operations: atomic renames, safe copies and the file relocator.

mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod metadata;
mod relocate;
mod util;

pub use copy::safe_copy_and_rename;
pub use helpers::io_error_with_help;
pub use metadata::apply_metadata;
pub use relocate::{copy_file, move_file};

pub(crate) use io_copy::copy_streaming;
pub(crate) use util::{first_missing_dir, remove_created_dirs};
