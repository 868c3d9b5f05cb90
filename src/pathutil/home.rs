//! Home directory context.
//! Carries the user's home directory and the macOS gate explicitly so the
//! classifier and validator stay pure and testable without touching the environment.

use anyhow::{Result, anyhow};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Home {
    dir: PathBuf,
    macos: bool,
}

impl Home {
    /// Build a context for `dir`; the macOS gate follows the compile target.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: clean(&dir.into()),
            macos: cfg!(target_os = "macos"),
        }
    }

    /// Resolve the current user's home directory.
    pub fn detect() -> Result<Self> {
        dirs::home_dir()
            .map(Self::new)
            .ok_or_else(|| anyhow!("could not determine the home directory"))
    }

    /// Override the macOS gate (tests exercise both platforms this way).
    pub fn with_macos(mut self, macos: bool) -> Self {
        self.macos = macos;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_macos(&self) -> bool {
        self.macos
    }

    /// Component-wise containment; `/home/user2` is not under `/home/user`.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }

    /// Portable form of `path`: `~` for home itself, `~/a/b` below it,
    /// otherwise the path unchanged. Separators are always `/` after the tilde.
    pub fn contract(&self, path: &Path) -> String {
        match path.strip_prefix(&self.dir) {
            Ok(rel) if rel.as_os_str().is_empty() => "~".to_string(),
            Ok(rel) => format!("~/{}", to_slash(rel)),
            Err(_) => path.display().to_string(),
        }
    }

    /// Inverse of [`Home::contract`]. Accepts `~/` and `~\` prefixes.
    pub fn expand(&self, s: &str) -> PathBuf {
        if s == "~" {
            return self.dir.clone();
        }
        if let Some(rest) = s.strip_prefix("~/").or_else(|| s.strip_prefix("~\\")) {
            let mut p = self.dir.clone();
            for part in rest.split(['/', '\\']).filter(|p| !p.is_empty()) {
                p.push(part);
            }
            return p;
        }
        PathBuf::from(s)
    }

    /// Absolute, lexically cleaned form of a user-supplied path. Expands `~`
    /// and resolves relative paths against `cwd`.
    pub fn absolutize(&self, input: &Path, cwd: &Path) -> PathBuf {
        let expanded = match input.to_str() {
            Some(s) if s.starts_with('~') => self.expand(s),
            _ => input.to_path_buf(),
        };
        if expanded.is_absolute() {
            clean(&expanded)
        } else {
            clean(&cwd.join(expanded))
        }
    }
}

/// Lexical normalization: drops `.` and collapses `..` without touching the filesystem.
/// `..` above the root is discarded, as on POSIX.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Join the normal components of a relative path with `/`.
pub fn to_slash(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a stored `/`-separated relative path into a native path below `base`.
pub fn join_slash(base: &Path, rel: &str) -> PathBuf {
    let mut p = base.to_path_buf();
    for part in rel.split('/').filter(|p| !p.is_empty()) {
        p.push(part);
    }
    p
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(clean(Path::new("")), PathBuf::from("."));
    }

    #[test]
    fn contract_and_expand_are_inverse() {
        let home = Home::new("/home/me");
        let p = Path::new("/home/me/.config/nvim");
        let portable = home.contract(p);
        assert_eq!(portable, "~/.config/nvim");
        assert_eq!(home.expand(&portable), p);
        assert_eq!(home.contract(Path::new("/home/me")), "~");
        assert_eq!(home.expand("~"), PathBuf::from("/home/me"));
    }

    #[test]
    fn contract_leaves_foreign_paths() {
        let home = Home::new("/home/me");
        assert_eq!(home.contract(Path::new("/home/me2/x")), "/home/me2/x");
        assert!(!home.contains(Path::new("/home/me2/x")));
    }

    #[test]
    fn absolutize_handles_tilde_and_relative() {
        let home = Home::new("/home/me");
        assert_eq!(
            home.absolutize(Path::new("~/.zshrc"), Path::new("/tmp")),
            PathBuf::from("/home/me/.zshrc")
        );
        assert_eq!(
            home.absolutize(Path::new("../x/./y"), Path::new("/tmp/w")),
            PathBuf::from("/tmp/x/y")
        );
    }
}
