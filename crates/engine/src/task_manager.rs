// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle transitions (spec.md §4.3): start/complete/fail a refresh
//! attempt, and reclaim zombies left behind by a crashed worker.
//!
//! Every operation is a single [`do_storage::StateStore::with_transaction`]
//! call, so the STALE→REFRESHING race (I3) and the completion idempotence
//! properties (T1/T3, testable property 3) are enforced by the store's
//! catch-up-then-decide sequencing rather than by locking here.

use crate::error::EngineError;
use do_core::{Clock, NodeId, NodeState, Task, TaskId, TaskInfo};
use do_storage::{Event, StateStore};

pub struct TaskManager<C: Clock> {
    clock: C,
}

impl<C: Clock> TaskManager<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Start a refresh attempt, but only if the node is currently STALE.
    /// Returns [`EngineError::NotStale`] (the spec's distinguished
    /// `IsNotStale` condition) if the precondition fails.
    pub fn start_task(
        &self,
        store: &mut StateStore,
        nid: &NodeId,
        info: TaskInfo,
    ) -> Result<TaskId, EngineError> {
        let nid_owned = nid.clone();
        let now = self.clock.now();
        let outcome = store.with_transaction(move |state| {
            let is_stale = state
                .node(nid_owned.as_str())
                .map(|n| n.state == NodeState::Stale)
                .unwrap_or(false);
            if !is_stale {
                return Ok((None, Vec::new()));
            }
            let tid = TaskId::for_attempt(now, info.pid);
            let event = Event::TaskStarted {
                nid: nid_owned.clone(),
                tid: tid.clone(),
                started_at: now,
                info: info.clone(),
            };
            Ok((Some(tid), vec![event]))
        })?;
        outcome.ok_or_else(|| EngineError::NotStale(nid.clone()))
    }

    /// Start a refresh attempt unconditionally, used by explicit user
    /// refresh (`refresh_node(force=true)`) and by the worker when invoked
    /// with `--force`.
    pub fn force_start_task(
        &self,
        store: &mut StateStore,
        nid: &NodeId,
        info: TaskInfo,
    ) -> Result<TaskId, EngineError> {
        let nid = nid.clone();
        let now = self.clock.now();
        let tid = store.with_transaction(move |_state| {
            let tid = TaskId::for_attempt(now, info.pid);
            let event = Event::TaskStarted {
                nid: nid.clone(),
                tid: tid.clone(),
                started_at: now,
                info: info.clone(),
            };
            Ok((tid.clone(), vec![event]))
        })?;
        Ok(tid)
    }

    /// Mark a task DONE and its node FRESH, but only if the node's
    /// `current_tid` still equals `tid` — a stale retry's completion
    /// cannot clobber a newer attempt (testable property 3).
    pub fn complete_task(
        &self,
        store: &mut StateStore,
        nid: &NodeId,
        tid: &TaskId,
    ) -> Result<(), EngineError> {
        let nid = nid.clone();
        let tid = tid.clone();
        let now = self.clock.now();
        store.with_transaction(move |state| {
            let matches = state
                .node(nid.as_str())
                .and_then(|n| n.current_tid.as_ref())
                == Some(&tid);
            if !matches {
                return Ok(((), Vec::new()));
            }
            Ok((
                (),
                vec![Event::TaskCompleted {
                    nid,
                    tid,
                    completed_at: now,
                }],
            ))
        })?;
        Ok(())
    }

    /// Mark a task ERRORED and its node STALE, subject to the same
    /// `current_tid` guard as [`Self::complete_task`].
    pub fn fail_task(
        &self,
        store: &mut StateStore,
        nid: &NodeId,
        tid: &TaskId,
        error: String,
        traceback: Option<String>,
    ) -> Result<(), EngineError> {
        let nid = nid.clone();
        let tid = tid.clone();
        let now = self.clock.now();
        store.with_transaction(move |state| {
            let matches = state
                .node(nid.as_str())
                .and_then(|n| n.current_tid.as_ref())
                == Some(&tid);
            if !matches {
                return Ok(((), Vec::new()));
            }
            Ok((
                (),
                vec![Event::TaskFailed {
                    nid,
                    tid,
                    completed_at: now,
                    error: error.clone(),
                    traceback: traceback.clone(),
                }],
            ))
        })?;
        Ok(())
    }

    /// Reclaim every RUNNING task whose process no longer exists: the task
    /// becomes ZOMBIE and its node returns to STALE. One transaction per
    /// reclaimed task, so a single busy store doesn't block reclaiming the
    /// rest.
    pub fn sweep_zombies(
        &self,
        store: &mut StateStore,
        process_exists: impl Fn(u32) -> bool,
    ) -> Result<Vec<TaskId>, EngineError> {
        let running: Vec<Task> =
            store.with_read(|state| state.running_tasks().cloned().collect())?;

        let mut reclaimed = Vec::new();
        for task in running {
            if process_exists(task.info.pid) {
                continue;
            }
            let nid = task.nid.clone();
            let tid = task.id.clone();
            let now = self.clock.now();
            let did_reclaim = store.with_transaction(move |state| {
                let matches = state
                    .node(nid.as_str())
                    .and_then(|n| n.current_tid.as_ref())
                    == Some(&tid);
                if !matches {
                    return Ok((false, Vec::new()));
                }
                Ok((
                    true,
                    vec![Event::TaskZombied {
                        nid,
                        tid,
                        completed_at: now,
                    }],
                ))
            })?;
            if did_reclaim {
                reclaimed.push(task.id);
            }
        }
        Ok(reclaimed)
    }

    /// Newest task row by `started_at` for a node, if any attempts exist.
    pub fn last_task_for_node(
        &self,
        store: &mut StateStore,
        nid: &NodeId,
    ) -> Result<Option<Task>, EngineError> {
        Ok(store.with_read(|state| state.last_task_for_node(nid.as_str()).cloned())?)
    }
}

#[cfg(test)]
#[path = "task_manager_tests.rs"]
mod tests;
