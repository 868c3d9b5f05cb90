#![cfg(unix)]

//! A pending interrupt stops runs before any destructive step.

use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

use dotsync::prelude::*;
use dotsync::shutdown;

fn workspace() -> (TempDir, PathBuf, Workspace) {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let home = base.join("home");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(base.join("cloud")).unwrap();
    let ws = Workspace::new(
        Home::new(&home).with_macos(false),
        Storage::new(base.join("cloud")),
        BackupManager::new(base.join("backups")),
    );
    (td, home, ws)
}

#[test]
#[serial]
fn add_is_refused_once_interrupted() {
    shutdown::reset();
    let (_td, home, ws) = workspace();
    let zshrc = home.join(".zshrc");
    fs::write(&zshrc, "export EDITOR=vim").unwrap();

    shutdown::request();
    let res = dotsync::workflow::add(&ws, &zshrc, &AddOptions::default(), &mut ScriptedPrompter::default());
    shutdown::reset();

    let err = res.unwrap_err();
    assert!(matches!(err.downcast_ref::<DotsyncError>(), Some(DotsyncError::Interrupted)));
    assert!(fs::symlink_metadata(&zshrc).unwrap().file_type().is_file());
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "export EDITOR=vim");
    assert!(!ws.storage().entry_file("zsh", ".zshrc").exists());
    assert!(!ws.storage().manifest_path().exists());
}

#[test]
#[serial]
fn link_run_stops_and_reports_interrupted() {
    shutdown::reset();
    let (_td, home, ws) = workspace();
    let bashrc = home.join(".bashrc");
    fs::write(&bashrc, "PS1='$ '").unwrap();
    dotsync::workflow::add(&ws, &bashrc, &AddOptions::default(), &mut ScriptedPrompter::default()).unwrap();
    fs::remove_file(&bashrc).unwrap();

    shutdown::request();
    let report = dotsync::workflow::link(&ws, &LinkOptions::default(), &mut ScriptedPrompter::default()).unwrap();
    shutdown::reset();

    assert!(report.interrupted);
    assert!(report.files.is_empty());
    assert!(!report.is_success());
    assert!(fs::symlink_metadata(&bashrc).is_err());

    let report = dotsync::workflow::link(&ws, &LinkOptions::default(), &mut ScriptedPrompter::default()).unwrap();
    assert_eq!(report.outcome_of("bash", ".bashrc"), Some(&FileOutcome::Linked));
}
