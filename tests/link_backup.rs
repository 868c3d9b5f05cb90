#![cfg(unix)]

//! `link` on a second machine: plain local files are snapshotted before they are
//! replaced, and stale links are repaired without asking.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

use dotsync::prelude::*;

struct Machine {
    _td: TempDir,
    home: PathBuf,
    ws: Workspace,
}

/// Storage already populated by another machine: entry `git` with `.gitconfig`.
fn second_machine() -> Machine {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let home = base.join("home");
    fs::create_dir_all(&home).unwrap();
    let ws = Workspace::new(
        Home::new(&home).with_macos(false),
        Storage::new(base.join("cloud")),
        BackupManager::new(base.join("backups")),
    );
    let stored = ws.storage().entry_file("git", ".gitconfig");
    fs::create_dir_all(stored.parent().unwrap()).unwrap();
    fs::write(&stored, "[user]\n  name = cloud\n").unwrap();
    let mut m = Manifest::new();
    m.add_file("git", "~", ".gitconfig");
    m.save(&ws.storage().manifest_path()).unwrap();
    Machine { _td: td, home, ws }
}

#[test]
fn auto_backup_keeps_the_local_copy() {
    let m = second_machine();
    let local = m.home.join(".gitconfig");
    fs::write(&local, "[user]\n  name = local\n").unwrap();

    let opts = LinkOptions {
        entry: None,
        auto_backup: true,
    };
    let mut p = ScriptedPrompter::default();
    let report = dotsync::workflow::link(&m.ws, &opts, &mut p).unwrap();
    assert!(p.asked.is_empty(), "auto backup must not prompt");
    assert!(report.is_success());

    let Some(FileOutcome::BackedUp(backup)) = report.outcome_of("git", ".gitconfig").cloned() else {
        panic!("expected a backup, got {:?}", report.files);
    };
    assert!(backup.starts_with(m.ws.backups().dir()));
    assert_eq!(fs::read_to_string(&backup).unwrap(), "[user]\n  name = local\n");

    assert!(fs::symlink_metadata(&local).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&local).unwrap(), "[user]\n  name = cloud\n");
}

#[test]
fn prompted_backup_answer_links_the_file() {
    let m = second_machine();
    let local = m.home.join(".gitconfig");
    fs::write(&local, "local").unwrap();

    let mut p = ScriptedPrompter::new(["b"]);
    let report = dotsync::workflow::link(&m.ws, &LinkOptions::default(), &mut p).unwrap();
    assert_eq!(p.asked.len(), 1);
    assert!(p.asked[0].contains("[b]ackup and link"), "{}", p.asked[0]);
    assert!(matches!(report.outcome_of("git", ".gitconfig"), Some(FileOutcome::BackedUp(_))));
}

#[test]
fn skip_answer_leaves_the_file_alone() {
    let m = second_machine();
    let local = m.home.join(".gitconfig");
    fs::write(&local, "local").unwrap();

    let mut p = ScriptedPrompter::new(["s"]);
    let report = dotsync::workflow::link(&m.ws, &LinkOptions::default(), &mut p).unwrap();
    assert_eq!(report.outcome_of("git", ".gitconfig"), Some(&FileOutcome::Skipped));
    assert!(report.is_success());
    assert_eq!(fs::read_to_string(&local).unwrap(), "local");
    assert!(!m.ws.backups().dir().exists() || fs::read_dir(m.ws.backups().dir()).unwrap().count() == 0);
}

#[test]
fn broken_link_is_repaired_without_asking() {
    let m = second_machine();
    let local = m.home.join(".gitconfig");
    symlink(m.home.join("gone/.gitconfig"), &local).unwrap();

    let mut p = ScriptedPrompter::default();
    let report = dotsync::workflow::link(&m.ws, &LinkOptions::default(), &mut p).unwrap();
    assert!(p.asked.is_empty());
    assert_eq!(report.outcome_of("git", ".gitconfig"), Some(&FileOutcome::Repaired));
    assert_eq!(
        fs::read_link(&local).unwrap(),
        m.ws.storage().entry_file("git", ".gitconfig")
    );
}

#[test]
fn unknown_entry_is_an_error() {
    let m = second_machine();
    let opts = LinkOptions {
        entry: Some("nvim".into()),
        auto_backup: false,
    };
    let err = dotsync::workflow::link(&m.ws, &opts, &mut ScriptedPrompter::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DotsyncError>(),
        Some(DotsyncError::EntryNotFound(n)) if n == "nvim"
    ));
}
