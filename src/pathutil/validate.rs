//! Pre-flight checks for candidate paths and entry names.
//!
//! Checks run in a fixed order and the first fatal one wins; the outside-home
//! warning is only reported once every fatal check has passed.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;

use super::home::Home;
use crate::errors::DotsyncError;
use crate::fs_ops::io_error_with_help;

const PLIST_HINT: &str = "macOS 14+ does not support symlinks for plist files; use a copy-based tool such as Mackup Copy mode (https://github.com/lra/mackup#copy-mode) for these files";

/// Outcome of validating a candidate path.
#[derive(Debug)]
pub enum Validation {
    Ok,
    /// Non-blocking; the caller decides whether to ask for confirmation.
    Warn(String),
    Fatal(DotsyncError),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }
}

fn not_allowed(path: &Path, reason: &str) -> Validation {
    Validation::Fatal(DotsyncError::NotAllowed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

/// Validate `path` for `add`. Only unexpected metadata errors are returned as `Err`.
pub fn validate_for_add(path: &Path, home: &Home) -> Result<Validation> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Validation::Fatal(DotsyncError::NotFound(path.to_path_buf())));
        }
        Err(e) => return Err(io_error_with_help("inspect file", path)(e)),
    };

    let ft = meta.file_type();
    if ft.is_symlink() {
        return Ok(not_allowed(
            path,
            "cannot track symlinks; if this is already synced elsewhere, unlink it first",
        ));
    }
    if ft.is_dir() {
        return Ok(not_allowed(
            path,
            "cannot add directories; add individual files instead",
        ));
    }
    if !ft.is_file() {
        return Ok(not_allowed(path, "not a regular file"));
    }
    if home.is_macos() && is_preferences_plist(path, home) {
        return Ok(not_allowed(path, PLIST_HINT));
    }
    if !home.contains(path) {
        return Ok(Validation::Warn(
            "file is outside home directory; cross-machine portability not guaranteed".into(),
        ));
    }
    Ok(Validation::Ok)
}

fn is_preferences_plist(path: &Path, home: &Home) -> bool {
    let prefs = home.dir().join("Library").join("Preferences");
    path.starts_with(&prefs)
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("plist"))
}

/// Entry names become directory names in storage, so keep them to one plain segment.
pub fn validate_entry_name(name: &str) -> Result<(), DotsyncError> {
    let invalid = |reason| DotsyncError::InvalidEntryName {
        name: name.to_string(),
        reason,
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("name is empty"));
    }
    if trimmed != name {
        return Err(invalid("name has surrounding whitespace"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name contains a path separator"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name is a relative path component"));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn ordering_of_checks() {
        let td = tempdir().unwrap();
        let home = Home::new(td.path()).with_macos(false);

        let missing = td.path().join("nope");
        assert!(matches!(
            validate_for_add(&missing, &home).unwrap(),
            Validation::Fatal(DotsyncError::NotFound(_))
        ));

        let file = td.path().join(".zshrc");
        fs::write(&file, "x").unwrap();
        assert!(validate_for_add(&file, &home).unwrap().is_ok());

        let link = td.path().join("link");
        symlink(&file, &link).unwrap();
        match validate_for_add(&link, &home).unwrap() {
            Validation::Fatal(DotsyncError::NotAllowed { reason, .. }) => {
                assert!(reason.contains("symlinks"))
            }
            other => panic!("unexpected {other:?}"),
        }

        // A symlink to a directory is still rejected as a symlink.
        let dir_link = td.path().join("dirlink");
        symlink(td.path(), &dir_link).unwrap();
        match validate_for_add(&dir_link, &home).unwrap() {
            Validation::Fatal(DotsyncError::NotAllowed { reason, .. }) => {
                assert!(reason.contains("symlinks"))
            }
            other => panic!("unexpected {other:?}"),
        }

        match validate_for_add(td.path(), &home).unwrap() {
            Validation::Fatal(DotsyncError::NotAllowed { reason, .. }) => {
                assert!(reason.contains("directories"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn outside_home_is_a_warning() {
        let td = tempdir().unwrap();
        let home_dir = td.path().join("home");
        fs::create_dir_all(&home_dir).unwrap();
        let home = Home::new(&home_dir).with_macos(false);
        let outside = td.path().join("hosts");
        fs::write(&outside, "x").unwrap();
        assert!(matches!(
            validate_for_add(&outside, &home).unwrap(),
            Validation::Warn(_)
        ));
    }

    #[test]
    fn plist_rejected_only_on_macos() {
        let td = tempdir().unwrap();
        let prefs = td.path().join("Library").join("Preferences");
        fs::create_dir_all(&prefs).unwrap();
        let plist = prefs.join("com.example.App.PLIST");
        fs::write(&plist, "x").unwrap();

        let linux = Home::new(td.path()).with_macos(false);
        assert!(validate_for_add(&plist, &linux).unwrap().is_ok());

        let mac = Home::new(td.path()).with_macos(true);
        match validate_for_add(&plist, &mac).unwrap() {
            Validation::Fatal(DotsyncError::NotAllowed { reason, .. }) => {
                assert!(reason.contains("Mackup"))
            }
            other => panic!("unexpected {other:?}"),
        }

        // Plists elsewhere are fine.
        let other = td.path().join("other.plist");
        fs::write(&other, "x").unwrap();
        assert!(validate_for_add(&other, &mac).unwrap().is_ok());
    }

    #[test]
    fn entry_names() {
        assert!(validate_entry_name("zsh").is_ok());
        assert!(validate_entry_name("my-app.v2").is_ok());
        for bad in ["", "  ", "a/b", "a\\b", ".", "..", " zsh"] {
            assert!(validate_entry_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
