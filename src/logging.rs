// src/logging.rs

//! `tracing` subscriber setup for the `taskgate` binary.
//!
//! Filter selection:
//! 1. `--log-level` applies one level to everything
//! 2. otherwise `TASKGATE_LOG` is read as an `EnvFilter` directive string,
//!    e.g. `info` or `taskgate::dag=debug,info`
//! 3. otherwise `info`
//!
//! Output goes to stderr; stdout is reserved for `event: <id>` lines.

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "TASKGATE_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Resolve the subscriber filter from the CLI level and the raw
/// `TASKGATE_LOG` value.
pub fn build_filter(
    cli_level: Option<LogLevel>,
    env_directives: Option<&str>,
) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::default().add_directive(LevelFilter::from(level).into()));
    }

    match env_directives.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV_VAR} value '{directives}'")),
        None => Ok(EnvFilter::new("info")),
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

