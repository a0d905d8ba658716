use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use taskgate::engine::{Completion, TaskHandler, Workflow};
use taskgate::errors::Result;
use taskgate::events::Listener;
use taskgate::observe::{Notification, Observer};

#[derive(Default)]
struct ManualState {
    launched: Vec<String>,
    pending: HashMap<String, Completion>,
}

/// Task handlers whose completions are signalled by the test.
///
/// Each handler:
/// - records that its task was launched
/// - parks the completion handle until `complete` is called for that key
#[derive(Clone, Default)]
pub struct ManualTasks {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for `key` that parks its completion.
    pub fn handler(&self, key: &str) -> impl TaskHandler + 'static {
        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        move |completion: Completion| {
            let mut guard = inner.lock().unwrap();
            guard.launched.push(key.clone());
            guard.pending.insert(key.clone(), completion);
        }
    }

    /// Register `key` on the workflow with a parking handler.
    pub fn register(&self, workflow: &mut Workflow, key: &str, deps: &[&str]) -> Result<()> {
        workflow.register(key, deps.iter().copied(), self.handler(key))
    }

    /// Signal the parked completion of `key`. Returns `false` if `key` has
    /// no parked completion.
    pub fn complete(&self, key: &str, success: bool) -> bool {
        let completion = self.inner.lock().unwrap().pending.remove(key);
        match completion {
            Some(completion) => {
                completion.complete(success);
                true
            }
            None => false,
        }
    }

    /// Remove the parked completion of `key` without signalling it.
    pub fn take(&self, key: &str) -> Option<Completion> {
        self.inner.lock().unwrap().pending.remove(key)
    }

    /// Keys in launch order.
    pub fn launched(&self) -> Vec<String> {
        self.inner.lock().unwrap().launched.clone()
    }

    /// Keys with a parked completion, sorted.
    pub fn pending(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().unwrap().pending.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Handler that records its launch and completes before returning.
pub fn immediate(
    log: &Arc<Mutex<Vec<String>>>,
    key: &str,
    success: bool,
) -> impl TaskHandler + 'static {
    let log = Arc::clone(log);
    let key = key.to_string();
    move |completion: Completion| {
        log.lock().unwrap().push(key.clone());
        completion.complete(success);
    }
}

/// Shared, clonable record of values pushed by listeners or observers.
#[derive(Clone)]
pub struct Recorder<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

impl Recorder<String> {
    /// Listener that records each dispatched event id.
    pub fn listener(&self) -> impl Listener + 'static {
        let items = Arc::clone(&self.items);
        move |event: &str| items.lock().unwrap().push(event.to_string())
    }
}

impl Recorder<Notification> {
    /// Observer that records every notification.
    pub fn observer(&self) -> impl Observer + 'static {
        let items = Arc::clone(&self.items);
        move |notification: &Notification| items.lock().unwrap().push(notification.clone())
    }
}
