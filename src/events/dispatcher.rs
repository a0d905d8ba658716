// src/events/dispatcher.rs

use tracing::debug;

use crate::engine::EventId;
use crate::events::table::EventTable;

/// Events that become satisfied by `key` having just finished.
///
/// Only events containing `key` are examined. An event is satisfied when
/// every key in its condition set is finished. Because `finished` only grows
/// and a key finishes at most once, each event is returned by at most one
/// call over the lifetime of a run.
pub fn check_events<F>(table: &EventTable, key: &str, is_finished: F) -> Vec<EventId>
where
    F: Fn(&str) -> bool,
{
    let mut satisfied = Vec::new();

    for event in table.events_containing(key) {
        let conditions = table.conditions_of(event).unwrap_or(&[]);
        if conditions.iter().all(|k| is_finished(k)) {
            debug!(event = %event, task = %key, "event satisfied");
            satisfied.push(event.clone());
        }
    }

    satisfied
}
