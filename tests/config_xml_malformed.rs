use dotsync::config::load_config_from_xml_path;
use dotsync::errors::DotsyncError;
use dotsync::pathutil::Home;
use std::fs;
use tempfile::tempdir;

#[test]
fn malformed_xml_errors() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    // Missing closing tag for storage_path
    let xml = r#"<config>
  <storage_path>/srv/cloud
  <log_level>quiet</log_level>
</config>"#;
    fs::write(&cfg_path, xml).unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(format!("{err}").contains("parse config xml"));
}

#[test]
fn empty_storage_path_counts_as_not_initialized() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><storage_path>  </storage_path></config>").unwrap();
    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    let err = cfg.storage_root(&Home::new("/home/me")).unwrap_err();
    assert!(matches!(err.downcast_ref::<DotsyncError>(), Some(DotsyncError::NotInitialized)));
}
