//! Entry inference from a file path.
//!
//! Patterns, first match wins:
//! 1. `~/.config/<X>/...`                          -> name `X`, root `~/.config/X`
//! 2. `~/Library/Application Support/<X>/...`      -> name `X` (macOS only)
//! 3. `~/.<X>/...`                                 -> name `X`, root `~/.X`
//! 4. `~/.<X>` (single dotfile)                    -> root `~`, name without dot and `rc`
//!
//! Anything else (or anything outside home) yields `None`.

use std::path::{Component, Path};

use super::home::{Home, clean};

/// Guess of the entry a path belongs to. Root and relative path are portable:
/// the root uses `~` and the relative path is `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferResult {
    pub name: String,
    pub root: String,
    pub rel_path: String,
}

impl InferResult {
    fn new(name: &str, root: String, rest: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            root,
            rel_path: rest.join("/"),
        }
    }
}

/// Classify an absolute path against the home context.
pub fn infer(path: &Path, home: &Home) -> Option<InferResult> {
    let path = clean(path);
    let rel = path.strip_prefix(home.dir()).ok()?;

    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(s) => parts.push(s.to_str()?),
            _ => return None,
        }
    }
    let first = *parts.first()?;

    if first == ".config" && parts.len() >= 3 {
        let name = parts[1];
        return Some(InferResult::new(
            name,
            format!("~/.config/{name}"),
            &parts[2..],
        ));
    }

    if home.is_macos()
        && first == "Library"
        && parts.len() >= 4
        && parts[1] == "Application Support"
    {
        let name = parts[2];
        return Some(InferResult::new(
            name,
            format!("~/Library/Application Support/{name}"),
            &parts[3..],
        ));
    }

    let hidden = first.strip_prefix('.').filter(|n| !n.is_empty())?;

    if parts.len() >= 2 {
        return Some(InferResult::new(hidden, format!("~/{first}"), &parts[1..]));
    }

    let name = match hidden.strip_suffix("rc") {
        Some(stem) if !stem.is_empty() => stem,
        _ => hidden,
    };
    Some(InferResult::new(name, "~".to_string(), &parts))
}
