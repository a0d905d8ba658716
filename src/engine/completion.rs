// src/engine/completion.rs

//! Single-shot completion handle given to each launched task handler.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TaskKey, TaskOutcome};

/// Completion handle for one launch of one task.
///
/// Signalling consumes the handle, so a launch can report at most once.
/// The handle only enqueues a [`RuntimeEvent::TaskCompleted`]; the engine
/// applies it on its own control path the next time it drains the channel,
/// which makes it safe to signal from any thread or from inside the
/// handler call itself.
///
/// Dropping the handle without signalling (for example because the handler
/// panicked) reports a failure.
pub struct Completion {
    task: TaskKey,
    tx: Option<mpsc::UnboundedSender<RuntimeEvent>>,
}

impl Completion {
    pub(crate) fn new(task: TaskKey, tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { task, tx: Some(tx) }
    }

    /// Report the outcome of the task.
    pub fn complete(mut self, success: bool) {
        self.send(TaskOutcome::from(success));
    }

    pub fn succeed(self) {
        self.complete(true);
    }

    pub fn fail(self) {
        self.complete(false);
    }

    fn send(&mut self, outcome: TaskOutcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        let event = RuntimeEvent::TaskCompleted {
            task: self.task.clone(),
            outcome,
        };
        if tx.send(event).is_err() {
            debug!(task = %self.task, "workflow gone; dropping completion");
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                task = %self.task,
                "completion dropped without being signalled; reporting failure"
            );
            self.send(TaskOutcome::Failed);
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("task", &self.task)
            .field("signalled", &self.tx.is_none())
            .finish()
    }
}
