// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;
use taskgate::cli::{CliArgs, LogLevel};

#[test]
fn defaults_to_taskgate_toml() {
    let args = CliArgs::try_parse_from(["taskgate"]).unwrap();
    assert_eq!(args.config_path(), PathBuf::from("Taskgate.toml"));
    assert_eq!(args.log_level, None);
    assert!(!args.dry_run);
}

#[test]
fn parses_all_flags() {
    let args = CliArgs::try_parse_from([
        "taskgate",
        "-c",
        "flows/boot.toml",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.config_path(), PathBuf::from("flows/boot.toml"));
    assert_eq!(args.log_level, Some(LogLevel::Debug));
    assert!(args.dry_run);
}

#[test]
fn rejects_unknown_log_level() {
    assert!(CliArgs::try_parse_from(["taskgate", "--log-level", "loud"]).is_err());
}
