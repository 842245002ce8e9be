use confsynth_fs::{ConfigStore, Error, NormalizedPath};
use rstest::rstest;
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct Settings {
    name: String,
    jobs: u32,
}

#[rstest]
#[case("settings.toml", "name = \"demo\"\njobs = 4\n")]
#[case("settings.json", r#"{"name": "demo", "jobs": 4}"#)]
#[case("settings.yml", "name: demo\njobs: 4\n")]
fn test_load_picks_format_from_extension(#[case] file: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(file);
    fs::write(&path, content).unwrap();

    let settings: Settings = ConfigStore::new().load(&NormalizedPath::new(&path)).unwrap();
    assert_eq!(
        settings,
        Settings {
            name: "demo".into(),
            jobs: 4
        }
    );
}

#[test]
fn test_load_reports_parse_errors_with_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigStore::new()
        .load::<Settings>(&NormalizedPath::new(&path))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "JSON"));
}

#[test]
fn test_load_rejects_unknown_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.ini");
    fs::write(&path, "name = demo\n").unwrap();

    let err = ConfigStore::new()
        .load::<Settings>(&NormalizedPath::new(&path))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { ref extension } if extension == "ini"));
}
