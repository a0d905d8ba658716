// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::validate::validate_config;
use crate::errors::TaskgateError;

/// Workflow definition as read from a TOML file, before validation.
///
/// ```toml
/// [task.init_app]
/// cmd = "echo init"
///
/// [task.update_info]
/// cmd = "sleep 0.1"
/// after = ["init_app"]
///
/// [event.app_start]
/// require = ["init_app"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// All tasks from `[task.<key>]`, keyed by task key.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All events from `[event.<id>]`, keyed by event id.
    #[serde(default)]
    pub event: BTreeMap<String, EventConfig>,
}

/// `[task.<key>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command that makes up the task body.
    pub cmd: String,

    /// Dependency list: this task waits for all tasks listed here.
    ///
    /// Keys that are not defined as tasks count as already finished.
    #[serde(default)]
    pub after: Vec<String>,
}

/// `[event.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    /// Task keys that must all have finished for the event to fire.
    pub require: Vec<String>,
}

/// A validated workflow definition.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// the graph is acyclic and every event refers to known tasks.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub task: BTreeMap<String, TaskConfig>,
    pub event: BTreeMap<String, EventConfig>,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskgateError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(Self {
            task: raw.task,
            event: raw.event,
        })
    }
}
