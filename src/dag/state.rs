// src/dag/state.rs

//! Execution state: the single source of truth for progress of a run.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::engine::TaskKey;

/// Public, read-only view of a single task's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Not launched yet; waiting on dependencies or on the next pass.
    Waiting,
    Running,
    Finished,
    /// The task's handler reported failure.
    Failed,
    /// A dependency (transitively) failed, so the task cannot launch.
    Blocked,
}

/// Mutable `running` / `finished` / `failed` sets for one run.
///
/// Invariants:
/// - a key is in at most one of the three sets
/// - `finished` only grows
/// - `remaining[key]` is the number of registered dependencies of `key`
///   that are not finished yet
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    running: HashSet<TaskKey>,
    finished: HashSet<TaskKey>,
    /// Finished keys in completion order.
    finished_order: Vec<TaskKey>,
    failed: HashSet<TaskKey>,
    remaining: HashMap<TaskKey, usize>,
}

impl ExecutionState {
    /// Fresh state for the given registry: nothing running, nothing finished.
    pub fn new(graph: &DagGraph) -> Self {
        let remaining = graph
            .tasks()
            .map(|key| (key.to_string(), graph.known_dependencies_of(key).count()))
            .collect();

        Self {
            remaining,
            ..Self::default()
        }
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.running.contains(key)
    }

    pub fn is_finished(&self, key: &str) -> bool {
        self.finished.contains(key)
    }

    pub fn is_failed(&self, key: &str) -> bool {
        self.failed.contains(key)
    }

    /// Number of registered dependencies of `key` not yet finished.
    pub fn remaining_deps(&self, key: &str) -> usize {
        self.remaining.get(key).copied().unwrap_or(0)
    }

    /// Neither running, finished nor failed, and every dependency finished.
    pub fn is_ready(&self, key: &str) -> bool {
        self.remaining.contains_key(key)
            && !self.is_running(key)
            && !self.is_finished(key)
            && !self.is_failed(key)
            && self.remaining_deps(key) == 0
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Finished keys, in the order they finished.
    pub fn finished(&self) -> &[TaskKey] {
        &self.finished_order
    }

    pub(crate) fn mark_running(&mut self, key: &str) {
        debug!(task = %key, "marking Running");
        self.running.insert(key.to_string());
    }

    /// Move `key` from running to finished and return the dependents whose
    /// last outstanding dependency this was.
    pub(crate) fn mark_finished(&mut self, key: &str, graph: &DagGraph) -> Vec<TaskKey> {
        self.running.remove(key);
        if !self.finished.insert(key.to_string()) {
            return Vec::new();
        }
        self.finished_order.push(key.to_string());

        let mut unblocked = Vec::new();
        for dependent in graph.dependents_of(key) {
            if let Some(count) = self.remaining.get_mut(dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    unblocked.push(dependent.clone());
                }
            }
        }
        unblocked
    }

    pub(crate) fn mark_failed(&mut self, key: &str) {
        self.running.remove(key);
        self.failed.insert(key.to_string());
    }

    /// Forget a failure so the task can be launched again. Returns whether
    /// the key was failed.
    pub(crate) fn clear_failed(&mut self, key: &str) -> bool {
        self.failed.remove(key)
    }
}
