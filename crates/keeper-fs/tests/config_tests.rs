use keeper_fs::{ConfigStore, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestConfig {
    name: String,
    count: i32,
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.toml");
    fs::write(&file_path, "name = \"test\"\ncount = 42").unwrap();

    let config: TestConfig = ConfigStore::new().load(&file_path).unwrap();

    assert_eq!(config.name, "test");
    assert_eq!(config.count, 42);
}

#[test]
fn test_load_json_with_bom() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mod.json");
    fs::write(&file_path, "\u{feff}{\"name\": \"test\", \"count\": 42}").unwrap();

    let config: TestConfig = ConfigStore::new().load(&file_path).unwrap();

    assert_eq!(config, TestConfig { name: "test".into(), count: 42 });
}

#[test]
fn test_load_invalid_json_reports_path() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mod.json");
    fs::write(&file_path, "{ not json").unwrap();

    let err = ConfigStore::new().load::<TestConfig>(&file_path).unwrap_err();

    match err {
        Error::ConfigParse { path, format, .. } => {
            assert_eq!(path, file_path);
            assert_eq!(format, "JSON");
        }
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.yaml");
    fs::write(&file_path, "name: test").unwrap();

    let err = ConfigStore::new().load::<TestConfig>(&file_path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "yaml"));
}

#[test]
fn test_save_and_reload_json() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mod.json");
    let store = ConfigStore::new();

    let original = TestConfig { name: "saved".into(), count: 7 };
    store.save(&file_path, &original).unwrap();
    let loaded: TestConfig = store.load(&file_path).unwrap();

    assert_eq!(loaded, original);
}
