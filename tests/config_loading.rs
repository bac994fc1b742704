use std::io::Write;
use std::path::Path;
use std::time::Duration;

use cmdrun::config::{
    ConfigFile, load_and_validate, load_from_path, load_or_default, parse_duration,
    validate_config,
};
use cmdrun::errors::CmdrunError;
use cmdrun_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn full_config_is_loaded() {
    let file = write_config(
        r#"
[command]
dir = "build"
env = ["DEBUG=true", "OPTS=a=b"]
shell = "/bin/bash"
timeout = "10m"

[error_categories]
config = ["bad config", "configuration error"]
build = ["build failed"]
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config");

    assert_eq!(cfg.dir().map(|d| d.as_path()), Some(Path::new("build")));
    assert_eq!(cfg.env(), ["DEBUG=true", "OPTS=a=b"]);
    assert_eq!(cfg.shell(), "/bin/bash");
    assert_eq!(cfg.timeout(), Some(Duration::from_secs(600)));
    assert_eq!(cfg.error_categories().len(), 2);
    assert_eq!(cfg.error_categories()["build"], ["build failed"]);
}

#[test]
fn empty_file_gives_defaults() {
    let file = write_config("");

    let cfg = load_and_validate(file.path()).expect("valid config");

    assert!(cfg.dir().is_none());
    assert!(cfg.env().is_empty());
    assert_eq!(cfg.shell(), "/bin/sh");
    assert!(cfg.timeout().is_none());
    assert!(cfg.error_categories().is_empty());
}

#[test]
fn config_is_applied_to_a_command() {
    let cfg = ConfigFileBuilder::new()
        .dir("/srv/app")
        .env("A=1")
        .timeout("250ms")
        .category("test", &["FAILED"])
        .build();

    let cmd = cfg.to_command();

    assert_eq!(cmd.dir(), Some(Path::new("/srv/app")));
    assert_eq!(cmd.env(), ["A=1"]);
    assert_eq!(cmd.timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config("[command]\nworking_dir = \"x\"\n");

    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, CmdrunError::TomlError(_)), "{err:?}");
}

#[test]
fn malformed_env_entry_is_a_config_error() {
    let err = ConfigFileBuilder::new().env("NOEQUALS").try_build().unwrap_err();

    match err {
        CmdrunError::ConfigError(msg) => assert!(msg.contains("NOEQUALS"), "{msg}"),
        other => panic!("expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn invalid_timeout_is_a_config_error() {
    let raw = ConfigFileBuilder::new().timeout("soon").raw();

    let err = validate_config(&raw).unwrap_err();
    assert!(err.to_string().contains("[command].timeout"), "{err}");
    assert!(ConfigFile::try_from(raw).is_err());
}

#[test]
fn empty_shell_and_empty_patterns_are_rejected() {
    assert!(ConfigFileBuilder::new().shell("  ").try_build().is_err());
    assert!(ConfigFileBuilder::new().category("build", &[""]).try_build().is_err());
    assert!(ConfigFileBuilder::new().category(" ", &["x"]).try_build().is_err());
    assert!(ConfigFileBuilder::new().category("build", &[]).try_build().is_ok());
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.toml");

    let err = load_or_default(Some(missing.as_path())).unwrap_err();
    assert!(err.to_string().contains("nope.toml"), "{err}");
}

#[test]
fn durations_parse_with_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());
    assert!(parse_duration("ms").is_err());
}

#[test]
fn oversized_durations_are_rejected() {
    let err = parse_duration("99999999999999999h").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    assert!(parse_duration("99999999999999999999s").is_err());
    assert_eq!(
        parse_duration("5124095576030431h"),
        Ok(Duration::from_secs(5124095576030431 * 3600))
    );
}
