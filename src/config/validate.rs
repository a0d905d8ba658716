// src/config/validate.rs

use tracing::warn;

use crate::config::model::RawConfigFile;
use crate::dag::DagGraph;
use crate::errors::{Result, TaskgateError};

/// Run semantic validation against a loaded workflow definition.
///
/// This checks:
/// - there is at least one task
/// - no task lists itself in `after`
/// - the task graph has no cycles
/// - every event has at least one condition and only names known tasks
///
/// Unknown keys in `after` are allowed: the engine treats them as finished.
/// They are reported as warnings.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_events(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskgateError::ConfigError(
            "definition must contain at least one [task.<key>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(TaskgateError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                warn!(
                    task = %name,
                    dep = %dep,
                    "unknown dependency in `after`; it will be treated as finished"
                );
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let graph = DagGraph::from_reliance(
        cfg.task
            .iter()
            .map(|(name, task)| (name.clone(), task.after.clone())),
    )?;
    graph.validate()
}

fn validate_events(cfg: &RawConfigFile) -> Result<()> {
    for (event, ev) in cfg.event.iter() {
        if ev.require.is_empty() {
            return Err(TaskgateError::ConfigError(format!(
                "event '{}' must require at least one task",
                event
            )));
        }
        for key in ev.require.iter() {
            if !cfg.task.contains_key(key) {
                return Err(TaskgateError::ConfigError(format!(
                    "event '{}' requires unknown task '{}'",
                    event, key
                )));
            }
        }
    }
    Ok(())
}
