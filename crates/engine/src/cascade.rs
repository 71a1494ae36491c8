// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manual invalidation and deletion (spec.md §4.6): `set_node_stale` pushes
//! staleness down the dependency graph in a single transaction, `delete_node`
//! removes a persisted row outright, and `refresh_node` runs a forced refresh
//! inline in the caller's own process.

use crate::error::EngineError;
use crate::registry::Registry;
use crate::task_manager::TaskManager;
use crate::worker;
use do_core::{Clock, NodeId, NodeState, TaskInfo};
use do_storage::{Event, StateStore};
use do_stores::Store;

/// Mark `id` STALE (or REFRESHING_STALE if it's mid-refresh) and cascade the
/// same transition down every downstream node, in one transaction so a
/// concurrent reader never observes a half-cascaded graph (I4).
///
/// Returns the `(id, new_state)` pairs actually changed, so the caller can
/// update its registry state cache without a full reload.
pub fn set_node_stale(
    store: &mut StateStore,
    registry: &Registry,
    id: &NodeId,
) -> Result<Vec<(NodeId, NodeState)>, EngineError> {
    let closure: Vec<NodeId> = std::iter::once(id.clone())
        .chain(registry.downstream_nodes(id))
        .collect();

    let changes = store.with_transaction(move |state| {
        let mut events = Vec::new();
        let mut changes = Vec::new();
        for nid in &closure {
            let Some(record) = state.node(nid.as_str()) else {
                continue;
            };
            let next = match record.state {
                NodeState::Fresh | NodeState::Expired => Some(NodeState::Stale),
                NodeState::Refreshing => Some(NodeState::RefreshingStale),
                NodeState::Stale | NodeState::RefreshingStale | NodeState::Orphan => None,
            };
            if let Some(next) = next {
                events.push(Event::NodeStateSet {
                    id: nid.clone(),
                    state: next,
                });
                changes.push((nid.clone(), next));
            }
        }
        Ok((changes.clone(), events))
    })?;

    Ok(changes)
}

/// Delete a node's persisted row outright. The registry's in-memory
/// descriptor (and any downstream Orphan backpatching) is the caller's
/// concern — this only touches the state store.
pub fn delete_node(store: &mut StateStore, id: &NodeId) -> Result<(), EngineError> {
    let id = id.clone();
    store.with_transaction(move |_state| Ok(((), vec![Event::NodeDeleted { id: id.clone() }])))?;
    Ok(())
}

/// Force a refresh through regardless of current state, running the
/// refresher inline in the calling process rather than spawning a detached
/// worker — this is the synchronous path `do node refresh` and the public
/// API's `refresh_node` use, distinct from the tick loop's async workers.
#[allow(clippy::too_many_arguments)]
pub fn refresh_node<C: Clock>(
    store: &mut StateStore,
    task_manager: &TaskManager<C>,
    binding: &crate::catalog::RefresherBinding,
    backend: &dyn Store,
    nid: &NodeId,
    info: TaskInfo,
) -> Result<do_core::Task, EngineError> {
    worker::execute_refresh(store, task_manager, binding, backend, nid, info, true)?
        .ok_or_else(|| EngineError::Internal("forced refresh unexpectedly skipped".to_string()))
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
