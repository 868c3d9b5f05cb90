//! Unique hidden sibling names for write-then-rename, shared by atomic writes
//! and the copy fallback.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pattern: `.<file>.dotsync.<pid>.<nanos>.<seq>.tmp` next to `target`.
pub fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let stem = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(".{stem}.dotsync.{pid}.{nanos}.{seq}.tmp");
    target.parent().unwrap_or_else(|| Path::new(".")).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn uniqueness_concurrent() {
        let handles: Vec<_> = (0..32)
            .map(|_| thread::spawn(|| tmp_sibling_name(Path::new("dir/.dotsync.json"))))
            .collect();
        let set: HashSet<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(set.len(), 32);
        assert!(set.iter().all(|p| p.starts_with("dir")));
    }

    #[test]
    fn names_are_hidden_siblings() {
        let p = tmp_sibling_name(Path::new("store/zsh/.zshrc"));
        assert_eq!(p.parent(), Some(Path::new("store/zsh")));
        let name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("..zshrc.dotsync."), "{name}");
        assert!(name.ends_with(".tmp"));
    }
}
