// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] holds the task registry: dependencies, dependents and the
//!   registration order of tasks.
//! - [`state`] tracks which tasks are running, finished or failed.
//! - [`scheduler`] contains the pure state machine that decides which tasks
//!   are ready to launch and which events a completion satisfies.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state;

pub use graph::DagGraph;
pub use scheduler::{RunStatus, Scheduler, Snapshot};
pub use scheduler_step::SchedulerStep;
pub use state::{ExecutionState, TaskState};
