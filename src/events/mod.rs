// src/events/mod.rs

//! Events: derived notifications fired once a fixed set of tasks finished.
//!
//! - [`table`] holds the static event definitions and a task → events index.
//! - [`dispatcher`] decides which events a just-finished task satisfies.

pub mod dispatcher;
pub mod table;

pub use dispatcher::check_events;
pub use table::EventTable;

/// Application callback notified once per satisfied event.
pub trait Listener: Send {
    fn on_event(&mut self, event: &str);
}

impl<F> Listener for F
where
    F: FnMut(&str) + Send,
{
    fn on_event(&mut self, event: &str) {
        self(event)
    }
}
