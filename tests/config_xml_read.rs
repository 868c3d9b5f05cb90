use assert_fs::prelude::*;
use dotsync::config::{LogLevel, load_config_from_xml_path};
use dotsync::pathutil::Home;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn reads_all_fields() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg_file = temp.child("config.xml");
    let xml = r#"<!-- written by hand -->
<config>
  <storage_path>~/Dropbox</storage_path>
  <log_level>info</log_level>
  <log_file>/tmp/dotsync-test.log</log_file>
  <backup_dir>/tmp/dotsync-backups</backup_dir>
</config>"#;
    cfg_file.write_str(xml).unwrap();

    let cfg = load_config_from_xml_path(cfg_file.path()).expect("load config");
    assert_eq!(cfg.storage_path.as_deref(), Some("~/Dropbox"));
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/dotsync-test.log")));
    assert_eq!(cfg.backup_dir, Some(PathBuf::from("/tmp/dotsync-backups")));

    let home = Home::new("/home/me");
    assert_eq!(cfg.storage_root(&home).unwrap(), PathBuf::from("/home/me/Dropbox"));
}

#[test]
fn missing_optional_fields_use_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><storage_path>/srv/cloud</storage_path></config>").unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.log_level, LogLevel::Normal);
    assert_eq!(cfg.log_file, None);
    assert_eq!(cfg.backup_dir, None);
}
