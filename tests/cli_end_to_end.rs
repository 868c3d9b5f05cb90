#![cfg(unix)]

//! Drives the binary through init, add, list, unlink and link against an
//! isolated HOME and config file.

use assert_cmd::cargo;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};

struct Sandbox {
    _td: TempDir,
    base: PathBuf,
    home: PathBuf,
    cloud: PathBuf,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap(); // avoid ambient symlinks in ancestors
        let home = base.join("home");
        let cloud = base.join("cloud");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&cloud).unwrap();
        let config = base.join("cfg/config.xml");
        Self {
            _td: td,
            base,
            home,
            cloud,
            config,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        let me = cargo::cargo_bin!("dotsync");
        Command::new(me)
            .args(args)
            .current_dir(&self.home)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.base.join("xdg/config"))
            .env("XDG_DATA_HOME", self.base.join("xdg/data"))
            .env("XDG_CACHE_HOME", self.base.join("xdg/cache"))
            .env("DOTSYNC_CONFIG", &self.config)
            .output()
            .expect("spawn binary")
    }
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

fn is_symlink(p: &Path) -> bool {
    fs::symlink_metadata(p).map(|m| m.file_type().is_symlink()).unwrap_or(false)
}

#[test]
fn full_cycle_through_the_binary() {
    let sb = Sandbox::new();
    let cloud = sb.cloud.to_str().unwrap();

    let out = sb.run(&["init", "--path", cloud]);
    assert!(out.status.success(), "init failed: {}", stderr(&out));
    assert!(stdout(&out).contains("dotsync initialized at"), "{}", stdout(&out));
    let xml = fs::read_to_string(&sb.config).unwrap();
    assert!(xml.contains(&format!("<storage_path>{cloud}</storage_path>")), "{xml}");
    assert!(sb.cloud.join("dotsync/.dotsync.json").is_file());

    let zshrc = sb.home.join(".zshrc");
    fs::write(&zshrc, "bindkey -e\n").unwrap();
    let out = sb.run(&["add", "~/.zshrc"]);
    assert!(out.status.success(), "add failed: {}", stderr(&out));
    assert!(stdout(&out).contains("added ~/.zshrc to entry 'zsh'"), "{}", stdout(&out));
    assert!(is_symlink(&zshrc));
    assert_eq!(
        fs::read_to_string(sb.cloud.join("dotsync/zsh/.zshrc")).unwrap(),
        "bindkey -e\n"
    );

    let out = sb.run(&["list", "--details"]);
    assert!(out.status.success());
    let listing = stdout(&out);
    assert!(listing.contains("zsh  ~  (1 file, all linked)"), "{listing}");
    assert!(listing.contains("[ok]"), "{listing}");

    let out = sb.run(&["unlink"]);
    assert!(out.status.success(), "unlink failed: {}", stderr(&out));
    assert!(stdout(&out).contains("[unlinked]"), "{}", stdout(&out));
    assert!(!is_symlink(&zshrc));
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "bindkey -e\n");

    let out = sb.run(&["list"]);
    assert!(stdout(&out).contains("(1 file, not linked)"), "{}", stdout(&out));

    let out = sb.run(&["link", "--backup"]);
    assert!(out.status.success(), "link failed: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[backed up]"), "{text}");
    assert!(text.contains("1 changed, 0 already in place, 0 skipped, 0 failed"), "{text}");
    assert!(is_symlink(&zshrc));
}

#[test]
fn link_prompt_without_input_skips() {
    let sb = Sandbox::new();
    let out = sb.run(&["init", "--path", sb.cloud.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));

    let gitconfig = sb.home.join(".gitconfig");
    fs::write(&gitconfig, "[core]").unwrap();
    assert!(sb.run(&["add", ".gitconfig"]).status.success());
    assert!(sb.run(&["unlink", "gitconfig"]).status.success());

    // stdin is closed, so the conflict prompt reads an empty answer.
    let out = sb.run(&["link"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("[skipped]"), "{}", stdout(&out));
    assert!(!is_symlink(&gitconfig));
}

#[test]
fn unknown_entry_fails() {
    let sb = Sandbox::new();
    assert!(sb.run(&["init", "--path", sb.cloud.to_str().unwrap()]).status.success());
    let out = sb.run(&["link", "nope"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("entry not found: nope"), "{}", stderr(&out));
}
