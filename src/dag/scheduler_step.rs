// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::engine::{EventId, TaskKey};

/// Structured result of a single scheduler step (a pass or a completion).
///
/// Tests can drive the scheduler by hand and make assertions on exactly
/// what each step changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks marked Running by this step, in registration order. The caller
    /// must invoke their handlers.
    pub newly_scheduled: Vec<TaskKey>,
    /// Events satisfied by this step, in dispatch order.
    pub satisfied_events: Vec<EventId>,
    /// The task that failed in this step followed by the dependents it
    /// blocks.
    pub newly_failed: Vec<TaskKey>,
    /// Whether every registered task is finished after this step.
    pub all_finished: bool,
}
