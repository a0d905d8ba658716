// src/cli.rs

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::loader::default_config_path;

/// Run dependency-gated tasks from a definition file and print each event
/// as its task set finishes.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskgate", version, long_about = None)]
pub struct CliArgs {
    /// Workflow definition (TOML). Defaults to `Taskgate.toml` in the
    /// current directory.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level; overrides `TASKGATE_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the definition and print its tasks and events without
    /// running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
