// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::engine::TaskKey;
use crate::errors::{Result, TaskgateError};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must finish before this one can run.
    deps: Vec<TaskKey>,
    /// Direct dependents: registered tasks that list this one in their deps.
    dependents: Vec<TaskKey>,
}

/// Task registry keyed by task key.
///
/// Keeps the order in which tasks were registered, since the scheduler
/// examines candidates in that order, plus a reverse index (dependents) so a
/// completion only has to look at the tasks it can unblock.
///
/// Dependency keys that are not themselves registered are kept in `deps`
/// but never linked; the scheduler treats them as always finished.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    order: Vec<TaskKey>,
    nodes: HashMap<TaskKey, DagNode>,
}

impl DagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(key, deps)` pairs in iteration order.
    pub fn from_reliance<I, K, D>(reliance: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<TaskKey>,
        D: IntoIterator,
        D::Item: Into<TaskKey>,
    {
        let mut graph = Self::new();
        for (key, deps) in reliance {
            graph.add_task(key, deps.into_iter().map(Into::into).collect())?;
        }
        Ok(graph)
    }

    /// Register a task with its dependency list.
    ///
    /// Duplicate dependency entries are collapsed. Registering the same key
    /// twice is an error.
    pub fn add_task(&mut self, key: impl Into<TaskKey>, deps: Vec<TaskKey>) -> Result<()> {
        let key = key.into();
        if self.nodes.contains_key(&key) {
            return Err(TaskgateError::DuplicateTask(key));
        }

        let mut unique_deps: Vec<TaskKey> = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique_deps.contains(&dep) {
                unique_deps.push(dep);
            }
        }

        // Link to already-registered dependencies.
        for dep in &unique_deps {
            if let Some(dep_node) = self.nodes.get_mut(dep) {
                dep_node.dependents.push(key.clone());
            }
        }

        // Tasks registered earlier may already depend on this key.
        let mut dependents = Vec::new();
        for existing in &self.order {
            if self.nodes[existing].deps.contains(&key) {
                dependents.push(existing.clone());
            }
        }

        debug!(task = %key, deps = ?unique_deps, "registered task");

        self.order.push(key.clone());
        self.nodes.insert(
            key,
            DagNode {
                deps: unique_deps,
                dependents,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// All task keys, in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task, including unregistered keys.
    pub fn dependencies_of(&self, key: &str) -> &[TaskKey] {
        self.nodes
            .get(key)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Dependencies of a task that are themselves registered tasks.
    pub fn known_dependencies_of<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> {
        self.dependencies_of(key)
            .iter()
            .filter(|dep| self.nodes.contains_key(dep.as_str()))
            .map(|s| s.as_str())
    }

    /// Immediate dependents of a task, in registration order.
    pub fn dependents_of(&self, key: &str) -> &[TaskKey] {
        self.nodes
            .get(key)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `(task, dependency)` pairs whose dependency is not a registered task.
    ///
    /// Such dependencies never block: they count as finished from the start.
    pub fn unknown_dependencies(&self) -> Vec<(TaskKey, TaskKey)> {
        let mut unknown = Vec::new();
        for key in &self.order {
            for dep in &self.nodes[key].deps {
                if !self.nodes.contains_key(dep) {
                    unknown.push((key.clone(), dep.clone()));
                }
            }
        }
        unknown
    }

    /// Tasks without any registered dependency; these launch in the first pass.
    pub fn roots(&self) -> Vec<TaskKey> {
        self.order
            .iter()
            .filter(|key| self.known_dependencies_of(key).next().is_none())
            .cloned()
            .collect()
    }

    /// Reject graphs that contain a cycle (including self-dependencies).
    ///
    /// Tasks on a cycle could never satisfy "all dependencies finished", so
    /// the run would stall silently.
    pub fn validate(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for key in &self.order {
            graph.add_node(key.as_str());
        }

        for key in &self.order {
            for dep in self.known_dependencies_of(key) {
                graph.add_edge(dep, key.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(TaskgateError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
