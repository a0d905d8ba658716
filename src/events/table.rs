// src/events/table.rs

use std::collections::HashMap;

use tracing::debug;

use crate::engine::{EventId, TaskKey};
use crate::errors::{Result, TaskgateError};

/// Static mapping from event id to the task keys that must all finish.
///
/// Events keep their registration order; `events_containing` returns them
/// in that order, which is the order they are dispatched in when a single
/// completion satisfies several at once.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    order: Vec<EventId>,
    conditions: HashMap<EventId, Vec<TaskKey>>,
    by_task: HashMap<TaskKey, Vec<EventId>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(event, conditions)` pairs in iteration order.
    pub fn from_pairs<I, E, C>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (E, C)>,
        E: Into<EventId>,
        C: IntoIterator,
        C::Item: Into<TaskKey>,
    {
        let mut table = Self::new();
        for (event, conditions) in pairs {
            table.add_event(event, conditions.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    pub fn add_event(&mut self, event: impl Into<EventId>, conditions: Vec<TaskKey>) -> Result<()> {
        let event = event.into();
        if self.conditions.contains_key(&event) {
            return Err(TaskgateError::ConfigError(format!(
                "event '{event}' registered twice"
            )));
        }

        let mut unique: Vec<TaskKey> = Vec::with_capacity(conditions.len());
        for key in conditions {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }

        for key in &unique {
            self.by_task
                .entry(key.clone())
                .or_default()
                .push(event.clone());
        }

        debug!(event = %event, conditions = ?unique, "registered event");

        self.order.push(event.clone());
        self.conditions.insert(event, unique);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All event ids, in registration order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Condition set of an event, or `None` if it is unknown.
    pub fn conditions_of(&self, event: &str) -> Option<&[TaskKey]> {
        self.conditions.get(event).map(|c| c.as_slice())
    }

    /// Events whose condition set contains `key`, in registration order.
    pub fn events_containing(&self, key: &str) -> &[EventId] {
        self.by_task
            .get(key)
            .map(|e| e.as_slice())
            .unwrap_or(&[])
    }
}
