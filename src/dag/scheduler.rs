// src/dag/scheduler.rs

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state::{ExecutionState, TaskState};
use crate::engine::{TaskKey, TaskOutcome};
use crate::errors::{Result, TaskgateError};
use crate::events::{check_events, EventTable};

/// Overall status of a run, derived from the execution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// No scheduler pass has happened yet.
    NotStarted,
    /// At least one task is running; completions are still expected.
    InProgress { running: Vec<TaskKey> },
    /// Every registered task finished.
    Finished,
    /// Nothing is running and at least one task failed. `blocked` lists the
    /// tasks that can never launch because of those failures.
    Failed {
        failed: Vec<TaskKey>,
        blocked: Vec<TaskKey>,
    },
    /// Nothing is running, nothing failed, yet some tasks never became
    /// ready (e.g. a dependency cycle).
    Stalled { waiting: Vec<TaskKey> },
}

impl RunStatus {
    /// Whether the run can no longer progress on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Finished | RunStatus::Failed { .. } | RunStatus::Stalled { .. }
        )
    }
}

/// Running and finished keys at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Running keys, in registration order.
    pub running: Vec<TaskKey>,
    /// Finished keys, in completion order.
    pub finished: Vec<TaskKey>,
}

/// Scheduler holds the immutable registry and event table plus the mutable
/// execution state of one run.
///
/// It is a pure state machine: it never calls handlers or listeners. Each
/// operation returns a [`SchedulerStep`] describing which tasks the caller
/// must launch and which events it must dispatch.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    events: EventTable,
    state: ExecutionState,
    started: bool,
}

impl Scheduler {
    /// Construct a scheduler. The graph is not validated here; use
    /// [`DagGraph::validate`] first to reject cycles up front.
    pub fn new(graph: DagGraph, events: EventTable) -> Self {
        let state = ExecutionState::new(&graph);
        Self {
            graph,
            events,
            state,
            started: false,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Returns `true` once every registered task is finished.
    pub fn is_all_finished(&self) -> bool {
        self.state.finished_count() == self.graph.len()
    }

    /// Scheduler pass: launch every task that is ready.
    ///
    /// Candidates are examined in registration order; readiness alone decides
    /// which ones launch, so several independent tasks may be scheduled by a
    /// single pass.
    pub fn advance(&mut self) -> SchedulerStep {
        self.started = true;

        if self.is_all_finished() {
            return SchedulerStep {
                all_finished: true,
                ..SchedulerStep::default()
            };
        }

        let candidates: Vec<TaskKey> = self
            .graph
            .tasks()
            .filter(|key| self.state.is_ready(key))
            .map(|key| key.to_string())
            .collect();

        SchedulerStep {
            newly_scheduled: self.launch(candidates),
            ..SchedulerStep::default()
        }
    }

    /// Apply the completion of a running task.
    ///
    /// On success the task is finished, the events it completes are
    /// reported, and the dependents it unblocked are scheduled. On failure
    /// the task is recorded as failed and no pass runs; its dependents stay
    /// blocked until [`Scheduler::retry`] is called.
    ///
    /// A completion for a task that is not running (including a second
    /// completion for the same launch) is rejected.
    pub fn complete(&mut self, key: &str, outcome: TaskOutcome) -> Result<SchedulerStep> {
        if !self.graph.contains(key) {
            return Err(TaskgateError::TaskNotFound(key.to_string()));
        }
        if !self.state.is_running(key) {
            return Err(TaskgateError::NotRunning(key.to_string()));
        }

        match outcome {
            TaskOutcome::Success => {
                let unblocked = self.state.mark_finished(key, &self.graph);
                debug!(task = %key, unblocked = ?unblocked, "task finished");

                let satisfied_events =
                    check_events(&self.events, key, |k| self.state.is_finished(k));

                let all_finished = self.is_all_finished();
                let newly_scheduled = if all_finished {
                    Vec::new()
                } else {
                    self.launch(unblocked)
                };

                Ok(SchedulerStep {
                    newly_scheduled,
                    satisfied_events,
                    newly_failed: Vec::new(),
                    all_finished,
                })
            }
            TaskOutcome::Failed => {
                self.state.mark_failed(key);
                let blocked = self.blocked_by(&[key]);
                warn!(
                    task = %key,
                    blocked = ?blocked,
                    "task failed; dependents cannot run until it is retried"
                );

                let mut newly_failed = vec![key.to_string()];
                newly_failed.extend(blocked);

                Ok(SchedulerStep {
                    newly_failed,
                    ..SchedulerStep::default()
                })
            }
        }
    }

    /// Explicit re-trigger of a failed task: forget the failure and run a
    /// full scheduler pass.
    pub fn retry(&mut self, key: &str) -> Result<SchedulerStep> {
        if !self.graph.contains(key) {
            return Err(TaskgateError::TaskNotFound(key.to_string()));
        }
        if !self.state.clear_failed(key) {
            return Err(TaskgateError::NotFailed(key.to_string()));
        }

        info!(task = %key, "retrying failed task");
        Ok(self.advance())
    }

    pub fn status(&self) -> RunStatus {
        if !self.started {
            return RunStatus::NotStarted;
        }
        if self.is_all_finished() {
            return RunStatus::Finished;
        }

        if self.state.running_count() > 0 {
            let running = self
                .graph
                .tasks()
                .filter(|key| self.state.is_running(key))
                .map(|key| key.to_string())
                .collect();
            return RunStatus::InProgress { running };
        }

        if self.state.has_failures() {
            let failed: Vec<TaskKey> = self
                .graph
                .tasks()
                .filter(|key| self.state.is_failed(key))
                .map(|key| key.to_string())
                .collect();
            let roots: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
            let blocked = self.blocked_by(&roots);
            return RunStatus::Failed { failed, blocked };
        }

        let waiting = self
            .graph
            .tasks()
            .filter(|key| !self.state.is_finished(key))
            .map(|key| key.to_string())
            .collect();
        RunStatus::Stalled { waiting }
    }

    /// Per-task state, or `None` for an unknown key.
    pub fn state_of(&self, key: &str) -> Option<TaskState> {
        if !self.graph.contains(key) {
            return None;
        }

        let state = if self.state.is_finished(key) {
            TaskState::Finished
        } else if self.state.is_running(key) {
            TaskState::Running
        } else if self.state.is_failed(key) {
            TaskState::Failed
        } else if self.depends_on_failure(key) {
            TaskState::Blocked
        } else {
            TaskState::Waiting
        };
        Some(state)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            running: self
                .graph
                .tasks()
                .filter(|key| self.state.is_running(key))
                .map(|key| key.to_string())
                .collect(),
            finished: self.state.finished().to_vec(),
        }
    }

    /// Mark ready candidates as Running and return those actually scheduled.
    fn launch(&mut self, candidates: Vec<TaskKey>) -> Vec<TaskKey> {
        let mut scheduled = Vec::new();

        for key in candidates {
            if !self.state.is_ready(&key) {
                continue;
            }
            info!(task = %key, "dependencies satisfied; scheduling task");
            self.state.mark_running(&key);
            scheduled.push(key);
        }

        scheduled
    }

    /// Unfinished transitive dependents of the given tasks, in registration
    /// order.
    fn blocked_by(&self, roots: &[&str]) -> Vec<TaskKey> {
        let mut stack: Vec<&str> = roots
            .iter()
            .flat_map(|root| self.graph.dependents_of(root))
            .map(|s| s.as_str())
            .collect();
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(name) = stack.pop() {
            if self.state.is_finished(name) || !seen.insert(name) {
                continue;
            }
            stack.extend(self.graph.dependents_of(name).iter().map(|s| s.as_str()));
        }

        self.graph
            .tasks()
            .filter(|key| seen.contains(key) && !self.state.is_failed(key))
            .map(|key| key.to_string())
            .collect()
    }

    /// Whether any dependency of `key` is failed or itself blocked.
    fn depends_on_failure(&self, key: &str) -> bool {
        let mut stack: Vec<&str> = self.graph.known_dependencies_of(key).collect();
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(dep) = stack.pop() {
            if !seen.insert(dep) {
                continue;
            }
            if self.state.is_failed(dep) {
                return true;
            }
            if !self.state.is_finished(dep) {
                stack.extend(self.graph.known_dependencies_of(dep));
            }
        }
        false
    }
}
