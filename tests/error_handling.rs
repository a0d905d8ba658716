// tests/error_handling.rs

use std::io::Write;
use tempfile::NamedTempFile;
use taskgate::config::load_and_validate;
use taskgate::errors::TaskgateError;
use taskgate_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use taskgate_test_utils::init_tracing;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::ConfigError(msg)) => {
            assert!(msg.contains("cannot depend on itself"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_unknown_dependency_is_allowed() {
    init_tracing();

    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["provided_elsewhere"]
"#,
    );

    let cfg = load_and_validate(file.path()).expect("unknown `after` keys only warn");
    assert_eq!(cfg.task["A"].after, vec!["provided_elsewhere"]);
}

#[test]
fn test_event_with_unknown_task_returns_config_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"

[event.READY]
require = ["A", "B"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::ConfigError(msg)) => {
            assert!(msg.contains("event 'READY' requires unknown task 'B'"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_event_without_conditions_returns_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .with_event("NEVER", &[])
        .build_raw();

    match taskgate::config::ConfigFile::try_from(raw) {
        Err(TaskgateError::ConfigError(msg)) => assert!(msg.contains("NEVER")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_definition_returns_config_error() {
    let file = write_config("");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::ConfigError(_))
    ));
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = write_config(
        r#"
[task.A
cmd = "echo A"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::TomlError(_))
    ));
}

#[test]
fn test_task_without_cmd_returns_toml_error() {
    let file = write_config(
        r#"
[task.A]
after = []
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Taskgate.toml");

    assert!(matches!(
        load_and_validate(&missing),
        Err(TaskgateError::IoError(_))
    ));
}

#[test]
fn test_valid_definition_loads() {
    let file = write_config(
        r#"
[task.init]
cmd = "echo init"

[task.fetch]
cmd = "echo fetch"
after = ["init"]

[event.FETCHED]
require = ["init", "fetch"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.task.len(), 2);
    assert_eq!(cfg.event["FETCHED"].require, vec!["init", "fetch"]);
}
