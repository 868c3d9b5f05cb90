//! Platform-specific helpers.
//! Hides OS differences (Unix/Windows) behind a uniform API so the rest of the
//! codebase stays platform-agnostic.

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

pub(crate) use temp::tmp_sibling_name;

#[cfg(unix)]
pub use unix::{atomic_write, open_log_file_secure_append, set_dir_mode_0700};

#[cfg(not(unix))]
pub use windows::{atomic_write, open_log_file_secure_append, set_dir_mode_0700};
