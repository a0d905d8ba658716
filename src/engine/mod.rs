// src/engine/mod.rs

//! Orchestration engine for taskgate.
//!
//! This module ties together:
//! - the pure DAG scheduler (`crate::dag`)
//! - the task handlers that run the actual work
//! - the completion channel that marshals results back onto the single
//!   control path
//! - event dispatch to the registered listener and observer
//!
//! [`workflow`] holds registration and the synchronous operations
//! (`run`, `advance`, `on_complete`, `pump`); [`runtime`] adds the async
//! drive loop on top of it.

/// Canonical task key type used throughout the engine.
pub type TaskKey = String;

/// Identifier of an event ("all these tasks have finished").
pub type EventId = String;

/// Outcome reported by a task handler through its [`Completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

impl From<bool> for TaskOutcome {
    fn from(success: bool) -> Self {
        if success {
            TaskOutcome::Success
        } else {
            TaskOutcome::Failed
        }
    }
}

/// Events flowing into the engine from handlers and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A task handler signalled its completion handle.
    TaskCompleted { task: TaskKey, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod completion;
pub mod runtime;
pub mod workflow;

pub use completion::Completion;
pub use workflow::{BoxedHandler, TaskHandler, Workflow};
