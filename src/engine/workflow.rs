// src/engine/workflow.rs

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{DagGraph, RunStatus, Scheduler, SchedulerStep, Snapshot, TaskState};
use crate::engine::completion::Completion;
use crate::engine::{EventId, RuntimeEvent, TaskKey, TaskOutcome};
use crate::errors::{Result, TaskgateError};
use crate::events::{EventTable, Listener};
use crate::observe::{Notification, Observer, TracingObserver};

/// The body of a task.
///
/// `start` is called at most once per launch with the completion handle for
/// that launch. It may signal the handle before returning or move it into
/// background work and signal it later. The handler is not told which task
/// it belongs to; that identity is fixed where it is registered.
pub trait TaskHandler: Send {
    fn start(&self, completion: Completion);
}

impl<F> TaskHandler for F
where
    F: Fn(Completion) + Send,
{
    fn start(&self, completion: Completion) {
        self(completion)
    }
}

pub type BoxedHandler = Box<dyn TaskHandler>;

/// A dependency-gated workflow: registry, listener, observer and the
/// scheduler state of one run.
///
/// Registration happens first (`register*`), then `run()` validates the
/// graph and performs the first scheduler pass. From then on every state
/// change goes through `&mut self` on the owner's control path: completions
/// are queued by [`Completion`] handles and applied by [`Workflow::pump`] or
/// the async [`Workflow::drive`] loop.
pub struct Workflow {
    handlers: Option<HashMap<TaskKey, BoxedHandler>>,
    handler_order: Vec<TaskKey>,
    reliance: Option<HashMap<TaskKey, Vec<TaskKey>>>,
    events: EventTable,
    listener: Option<Box<dyn Listener>>,
    observer: Box<dyn Observer>,
    scheduler: Option<Scheduler>,
    event_tx: mpsc::UnboundedSender<RuntimeEvent>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    shutdown_requested: bool,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("handler_order", &self.handler_order)
            .field("events", &self.events)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            handlers: None,
            handler_order: Vec::new(),
            reliance: None,
            events: EventTable::new(),
            listener: None,
            observer: Box::new(TracingObserver),
            scheduler: None,
            event_tx,
            event_rx,
            shutdown_requested: false,
        }
    }

    /// Register one task: its key, dependency keys and handler.
    pub fn register<K, D, H>(&mut self, key: K, deps: D, handler: H) -> Result<()>
    where
        K: Into<TaskKey>,
        D: IntoIterator,
        D::Item: Into<TaskKey>,
        H: TaskHandler + 'static,
    {
        self.ensure_registration_open()?;
        let key = key.into();
        self.insert_handler(key.clone(), Box::new(handler))?;
        self.reliance
            .get_or_insert_with(HashMap::new)
            .insert(key, deps.into_iter().map(Into::into).collect());
        Ok(())
    }

    /// Register handlers in bulk. Iteration order becomes registration order.
    ///
    /// A duplicate key, against earlier registrations or within the batch,
    /// rejects the whole batch and registers nothing.
    pub fn register_handlers<I, K>(&mut self, handlers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, BoxedHandler)>,
        K: Into<TaskKey>,
    {
        self.ensure_registration_open()?;
        let batch: Vec<(TaskKey, BoxedHandler)> = handlers
            .into_iter()
            .map(|(key, handler)| (key.into(), handler))
            .collect();

        let existing = self.handlers.get_or_insert_with(HashMap::new);
        let mut seen = HashSet::new();
        for (key, _) in &batch {
            if existing.contains_key(key) || !seen.insert(key.as_str()) {
                return Err(TaskgateError::DuplicateTask(key.clone()));
            }
        }

        for (key, handler) in batch {
            self.insert_handler(key, handler)?;
        }
        Ok(())
    }

    /// Register dependency lists in bulk. A task without an entry has no
    /// dependencies; a later entry for the same key replaces the earlier one.
    pub fn register_reliance<I, K, D>(&mut self, reliance: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<TaskKey>,
        D: IntoIterator,
        D::Item: Into<TaskKey>,
    {
        self.ensure_registration_open()?;
        let map = self.reliance.get_or_insert_with(HashMap::new);
        for (key, deps) in reliance {
            let key = key.into();
            let deps: Vec<TaskKey> = deps.into_iter().map(Into::into).collect();
            if map.insert(key.clone(), deps).is_some() {
                debug!(task = %key, "replacing earlier reliance entry");
            }
        }
        Ok(())
    }

    /// Register events in bulk: event id → task keys that must all finish.
    ///
    /// A duplicate event id rejects the whole batch.
    pub fn register_events<I, E, C>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = (E, C)>,
        E: Into<EventId>,
        C: IntoIterator,
        C::Item: Into<TaskKey>,
    {
        self.ensure_registration_open()?;
        let mut table = self.events.clone();
        for (event, conditions) in events {
            table.add_event(event, conditions.into_iter().map(Into::into).collect())?;
        }
        self.events = table;
        Ok(())
    }

    /// Set the listener notified once per satisfied event.
    pub fn register_listener<L>(&mut self, listener: L) -> Result<()>
    where
        L: Listener + 'static,
    {
        self.ensure_registration_open()?;
        self.listener = Some(Box::new(listener));
        Ok(())
    }

    /// Replace the default [`TracingObserver`].
    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: Observer + 'static,
    {
        self.observer = Box::new(observer);
    }

    /// Sender for feeding [`RuntimeEvent`]s from outside, e.g. a Ctrl-C task.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<RuntimeEvent> {
        self.event_tx.clone()
    }

    /// Validate the registry and perform the first scheduler pass.
    ///
    /// Returns whether every task is already finished, which is only the
    /// case for an empty registry.
    pub fn run(&mut self) -> Result<bool> {
        if self.scheduler.is_some() {
            return Err(TaskgateError::AlreadyStarted);
        }
        let (Some(handlers), Some(reliance)) = (self.handlers.as_ref(), self.reliance.as_ref())
        else {
            return Err(TaskgateError::MissingRegistry);
        };

        let mut graph = DagGraph::new();
        for key in &self.handler_order {
            let deps = reliance.get(key).cloned().unwrap_or_default();
            graph.add_task(key.clone(), deps)?;
        }

        for key in reliance.keys() {
            if !handlers.contains_key(key) {
                warn!(task = %key, "reliance entry has no handler; ignoring it");
            }
        }

        graph.validate()?;

        for (task, dep) in graph.unknown_dependencies() {
            warn!(
                task = %task,
                dep = %dep,
                "dependency is not a registered task; treating it as finished"
            );
        }

        for event in self.events.events() {
            let conditions = self.events.conditions_of(event).unwrap_or(&[]);
            if conditions.is_empty() {
                warn!(event = %event, "event has no conditions and will never fire");
            }
            for key in conditions.iter().filter(|k| !graph.contains(k)) {
                warn!(
                    event = %event,
                    task = %key,
                    "event condition is not a registered task; event will never fire"
                );
            }
        }

        info!(
            tasks = graph.len(),
            events = self.events.len(),
            roots = ?graph.roots(),
            "starting workflow"
        );

        let mut scheduler = Scheduler::new(graph, std::mem::take(&mut self.events));
        let step = scheduler.advance();
        self.scheduler = Some(scheduler);

        let all_finished = step.all_finished;
        self.apply_step(step);
        Ok(all_finished)
    }

    /// Scheduler pass. Starts the workflow if `run()` was not called yet.
    pub fn advance(&mut self) -> Result<bool> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return self.run();
        };
        let step = scheduler.advance();
        let all_finished = step.all_finished;
        self.apply_step(step);
        Ok(all_finished)
    }

    /// Apply the completion of a running task: update state, dispatch the
    /// events it satisfies and launch the tasks it unblocked.
    pub fn on_complete(&mut self, key: &str, success: bool) -> Result<()> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Err(TaskgateError::NotRunning(key.to_string()));
        };
        let step = scheduler.complete(key, TaskOutcome::from(success))?;

        if success {
            self.observer
                .notify(&Notification::TaskFinished(key.to_string()));
        } else {
            self.observer.notify(&Notification::TaskFailed {
                task: key.to_string(),
                blocked: step.newly_failed.iter().skip(1).cloned().collect(),
            });
        }

        self.apply_step(step);
        Ok(())
    }

    /// Re-trigger a failed task.
    pub fn retry(&mut self, key: &str) -> Result<()> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Err(TaskgateError::NotFailed(key.to_string()));
        };
        let step = scheduler.retry(key)?;
        self.apply_step(step);
        Ok(())
    }

    /// Apply every queued runtime event without blocking. Returns how many
    /// were handled.
    pub fn pump(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn status(&self) -> RunStatus {
        self.scheduler
            .as_ref()
            .map(Scheduler::status)
            .unwrap_or(RunStatus::NotStarted)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.scheduler
            .as_ref()
            .map(Scheduler::snapshot)
            .unwrap_or_default()
    }

    pub fn state_of(&self, key: &str) -> Option<TaskState> {
        self.scheduler.as_ref()?.state_of(key)
    }

    /// The scheduler, once the workflow has started.
    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    pub(crate) fn handle_event(&mut self, event: RuntimeEvent) -> Result<()> {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                self.on_complete(&task, outcome.is_success())
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                self.shutdown_requested = true;
                Ok(())
            }
        }
    }

    pub(crate) async fn next_event(&mut self) -> Option<RuntimeEvent> {
        self.event_rx.recv().await
    }

    fn ensure_registration_open(&self) -> Result<()> {
        if self.scheduler.is_some() {
            return Err(TaskgateError::AlreadyStarted);
        }
        Ok(())
    }

    fn insert_handler(&mut self, key: TaskKey, handler: BoxedHandler) -> Result<()> {
        let handlers = self.handlers.get_or_insert_with(HashMap::new);
        if handlers.contains_key(&key) {
            return Err(TaskgateError::DuplicateTask(key));
        }
        handlers.insert(key.clone(), handler);
        self.handler_order.push(key);
        Ok(())
    }

    /// Dispatch satisfied events, then launch scheduled tasks.
    fn apply_step(&mut self, step: SchedulerStep) {
        for event in &step.satisfied_events {
            self.observer
                .notify(&Notification::EventDispatched(event.clone()));
            if let Some(listener) = self.listener.as_mut() {
                listener.on_event(event);
            }
        }

        self.launch(step.newly_scheduled);

        if step.all_finished {
            info!("all tasks finished");
        }
    }

    /// Invoke the handler of each scheduled task with a fresh completion.
    ///
    /// A panicking handler is contained here; the completion it owned is
    /// dropped during unwinding and reports failure.
    fn launch(&mut self, keys: Vec<TaskKey>) {
        let Some(handlers) = self.handlers.as_ref() else {
            return;
        };

        for key in keys {
            self.observer.notify(&Notification::TaskStarted(key.clone()));
            let completion = Completion::new(key.clone(), self.event_tx.clone());

            let Some(handler) = handlers.get(&key) else {
                error!(task = %key, "scheduled task has no handler");
                completion.fail();
                continue;
            };

            let result = panic::catch_unwind(AssertUnwindSafe(move || handler.start(completion)));
            if result.is_err() {
                error!(task = %key, "task handler panicked; reporting failure");
            }
        }
    }
}
