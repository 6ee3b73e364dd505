use mprkit_settings::{ConfigError, PostOptions, SettingsError};
use tempfile::TempDir;

fn sample() -> PostOptions {
    let mut options = PostOptions::default();
    options.precision = 2;
    options.workpiece_length = Some(720.0);
    options.workpiece_thickness = Some(19.0);
    options.use_part_name = true;
    options.coordinate_system = Some("G54".to_string());
    options
}

#[test]
fn test_toml_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    sample().save_to_file(&path).unwrap();
    let loaded = PostOptions::load_from_file(&path).unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn test_json_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    sample().save_to_file(&path).unwrap();
    let loaded = PostOptions::load_from_file(&path).unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "precision = 4\noutput_comments = false\n").unwrap();

    let loaded = PostOptions::load_from_file(&path).unwrap();
    assert_eq!(loaded.precision, 4);
    assert!(!loaded.output_comments);
    assert_eq!(loaded.default_tool, 101);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "precision: 3").unwrap();

    let err = PostOptions::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_invalid_file_values_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "workpiece_width = -3.0\n").unwrap();

    assert!(PostOptions::load_from_file(&path).is_err());
}

#[test]
fn test_args_override_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    sample().save_to_file(&path).unwrap();

    let mut options = PostOptions::load_from_file(&path).unwrap();
    options.apply_args("--precision=4 --no-comments").unwrap();
    assert_eq!(options.precision, 4);
    assert!(!options.output_comments);
    assert_eq!(options.workpiece_length, Some(720.0));
}
