// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from WAL replay.
//!
//! `settings`, `data_nodes`, and `tasks` are logical tables inside a single
//! in-memory structure rather than three SQL tables; `apply_event` is the
//! one place transitions happen, so invariants I3/I4/T1/T3 are enforced
//! structurally instead of by ad-hoc checks at every call site.

use chrono::{DateTime, Utc};
use do_core::{NodeId, NodeRecord, NodeState, Task, TaskId, TaskInfo, TaskState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Facts about what happened, replayed in order to derive `MaterializedState`.
///
/// # Idempotency requirement
///
/// Handlers in [`MaterializedState::apply_event`] must be idempotent:
/// applying the same event twice produces the same state as applying it
/// once. Preconditions (e.g. "node must be STALE", "tid must match
/// current_tid") are checked by the engine *before* an event is emitted;
/// `apply_event` itself performs unconditional assignment, which is safe
/// to re-run during WAL replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A node id appeared in the registry for the first time; seed a STALE row.
    NodeSeeded { id: NodeId },
    /// Direct state assignment used by cascades (`set_node_stale`) that
    /// don't touch `current_tid`.
    NodeStateSet { id: NodeId, state: NodeState },
    /// A refresh attempt began: node -> REFRESHING, task row inserted RUNNING.
    TaskStarted {
        nid: NodeId,
        tid: TaskId,
        started_at: DateTime<Utc>,
        info: TaskInfo,
    },
    /// A refresh attempt finished successfully: task -> DONE, node -> FRESH.
    TaskCompleted {
        nid: NodeId,
        tid: TaskId,
        completed_at: DateTime<Utc>,
    },
    /// A refresh attempt raised: task -> ERRORED, node -> STALE.
    TaskFailed {
        nid: NodeId,
        tid: TaskId,
        completed_at: DateTime<Utc>,
        error: String,
        traceback: Option<String>,
    },
    /// The zombie sweeper reclaimed a task whose process no longer exists.
    TaskZombied {
        nid: NodeId,
        tid: TaskId,
        completed_at: DateTime<Utc>,
    },
    /// `delete_node` removed a persisted row.
    NodeDeleted { id: NodeId },
    /// Snapshot schema was migrated to a new version.
    SchemaMigrated { version: u32 },
}

/// The complete materialized state: settings, data nodes, and tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    #[serde(rename = "v", default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: HashMap<String, NodeRecord>,
    #[serde(default)]
    pub tasks: HashMap<String, Task>,
}

fn current_version() -> u32 {
    CURRENT_SNAPSHOT_VERSION
}

impl Default for MaterializedState {
    fn default() -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            nodes: HashMap::new(),
            tasks: HashMap::new(),
        }
    }
}

impl MaterializedState {
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// All tasks currently RUNNING, for the zombie sweep.
    pub fn running_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(|t| t.state == TaskState::Running)
    }

    /// Newest task row by `started_at` for a given node.
    pub fn last_task_for_node(&self, nid: &str) -> Option<&Task> {
        self.tasks
            .values()
            .filter(|t| t.nid.as_str() == nid)
            .max_by_key(|t| t.started_at)
    }

    /// Apply an event to derive state changes. See the idempotency note on
    /// [`Event`].
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::NodeSeeded { id } => {
                self.nodes
                    .entry(id.as_str().to_string())
                    .or_insert_with(|| NodeRecord::seeded(id.clone()));
            }
            Event::NodeStateSet { id, state } => {
                if let Some(node) = self.nodes.get_mut(id.as_str()) {
                    node.state = *state;
                }
            }
            Event::TaskStarted {
                nid,
                tid,
                started_at,
                info,
            } => {
                self.tasks.insert(
                    tid.as_str().to_string(),
                    Task::running(tid.clone(), nid.clone(), *started_at, info.clone()),
                );
                let node = self
                    .nodes
                    .entry(nid.as_str().to_string())
                    .or_insert_with(|| NodeRecord::seeded(nid.clone()));
                node.state = NodeState::Refreshing;
                node.current_tid = Some(tid.clone());
            }
            Event::TaskCompleted {
                nid,
                tid,
                completed_at,
            } => {
                if let Some(task) = self.tasks.get_mut(tid.as_str()) {
                    task.state = TaskState::Done;
                    task.completed_at = Some(*completed_at);
                }
                if let Some(node) = self.nodes.get_mut(nid.as_str()) {
                    node.state = NodeState::Fresh;
                    node.current_tid = None;
                }
            }
            Event::TaskFailed {
                nid,
                tid,
                completed_at,
                error,
                traceback,
            } => {
                if let Some(task) = self.tasks.get_mut(tid.as_str()) {
                    task.state = TaskState::Errored;
                    task.completed_at = Some(*completed_at);
                    task.info.error = Some(error.clone());
                    task.info.traceback = traceback.clone();
                }
                if let Some(node) = self.nodes.get_mut(nid.as_str()) {
                    node.state = NodeState::Stale;
                    node.current_tid = None;
                }
            }
            Event::TaskZombied {
                nid,
                tid,
                completed_at,
            } => {
                if let Some(task) = self.tasks.get_mut(tid.as_str()) {
                    task.state = TaskState::Zombie;
                    task.completed_at = Some(*completed_at);
                }
                if let Some(node) = self.nodes.get_mut(nid.as_str()) {
                    node.state = NodeState::Stale;
                    node.current_tid = None;
                }
            }
            Event::NodeDeleted { id } => {
                self.nodes.remove(id.as_str());
            }
            Event::SchemaMigrated { version } => {
                self.version = *version;
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
