// src/engine/runtime.rs

//! Async drive loop around [`Workflow`].
//!
//! Handlers that complete in the background signal their [`Completion`]
//! from another task; this loop waits on the completion channel and applies
//! each result on the workflow's own control path, so the scheduler state
//! never needs a lock.
//!
//! [`Completion`]: crate::engine::Completion

use tracing::{debug, info};

use crate::dag::RunStatus;
use crate::engine::workflow::Workflow;
use crate::errors::{Result, TaskgateError};

impl Workflow {
    /// Drive the workflow until it reaches a terminal status or a shutdown
    /// is requested, and return the status at that point.
    ///
    /// Starts the workflow first if `run()` was not called yet. A task whose
    /// handler keeps its completion alive without ever signalling it keeps
    /// the run in progress indefinitely; there is no timeout.
    pub async fn drive(&mut self) -> Result<RunStatus> {
        if self.scheduler().is_none() {
            self.run()?;
        }

        loop {
            self.pump()?;

            if self.is_shutdown_requested() {
                let status = self.status();
                info!(?status, "stopping workflow drive loop on shutdown");
                return Ok(status);
            }

            let status = self.status();
            if status.is_terminal() {
                debug!(?status, "workflow reached terminal status");
                return Ok(status);
            }

            let Some(event) = self.next_event().await else {
                info!("runtime event channel closed; exiting");
                return Ok(self.status());
            };

            debug!(?event, "workflow received event");
            self.handle_event(event)?;
        }
    }

    /// Drive the workflow and turn a failed run into an error.
    ///
    /// A run interrupted by shutdown is not an error. `run()` rejects cycles
    /// and an unsignalled completion either reports failure on drop or keeps
    /// the run in progress, so `Stalled` only surfaces here if the scheduler
    /// invariants are broken.
    pub async fn run_to_completion(&mut self) -> Result<()> {
        match self.drive().await? {
            RunStatus::Finished => Ok(()),
            RunStatus::Failed { failed, blocked } => {
                Err(TaskgateError::RunFailed { failed, blocked })
            }
            RunStatus::Stalled { waiting } => Err(TaskgateError::Stalled(waiting)),
            status @ (RunStatus::InProgress { .. } | RunStatus::NotStarted) => {
                info!(?status, "workflow interrupted before finishing");
                Ok(())
            }
        }
    }
}
