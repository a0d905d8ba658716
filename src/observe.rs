// src/observe.rs

//! Structured observability hook for workflow progress.
//!
//! The engine reports every lifecycle change as a [`Notification`] to a
//! single [`Observer`]. The default [`TracingObserver`] turns them into
//! `tracing` records; tests plug in their own observer to record the
//! sequence.

use tracing::{info, warn};

use crate::engine::{EventId, TaskKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The task's handler is about to be invoked.
    TaskStarted(TaskKey),
    TaskFinished(TaskKey),
    /// The task failed; `blocked` are the dependents that cannot launch.
    TaskFailed { task: TaskKey, blocked: Vec<TaskKey> },
    EventDispatched(EventId),
}

pub trait Observer: Send {
    fn notify(&mut self, notification: &Notification);
}

impl<F> Observer for F
where
    F: FnMut(&Notification) + Send,
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Default observer: logs each notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::TaskStarted(task) => info!(task = %task, "task started"),
            Notification::TaskFinished(task) => info!(task = %task, "task finished"),
            Notification::TaskFailed { task, blocked } => {
                warn!(task = %task, blocked = ?blocked, "task failed")
            }
            Notification::EventDispatched(event) => info!(event = %event, "event dispatched"),
        }
    }
}
