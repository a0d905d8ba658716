// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskgateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task registered twice: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Workflow not ready: handlers and reliance must both be registered before run()")]
    MissingRegistry,

    #[error("Workflow already started; registration is closed")]
    AlreadyStarted,

    #[error("Completion for task that is not running: {0}")]
    NotRunning(String),

    #[error("Retry requested for task that has not failed: {0}")]
    NotFailed(String),

    #[error("Workflow failed: failed = {failed:?}, blocked = {blocked:?}")]
    RunFailed {
        failed: Vec<String>,
        blocked: Vec<String>,
    },

    #[error("Workflow stalled: no task can make progress, waiting = {0:?}")]
    Stalled(Vec<String>),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskgateError>;
