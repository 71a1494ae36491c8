// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory node graph: collection, upstream backpatching, and persisted
//! state reconciliation (spec.md §4.2).

use crate::error::EngineError;
use do_core::{Node, NodeId, NodeState};
use do_storage::{Event, StateStore};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// The in-memory node graph, built once at load time from source/model
/// definitions and kept in registry insertion order (this is the order
/// simultaneously-ready nodes are launched in, per spec.md §4.4's
/// tie-breaking rule).
#[derive(Debug, Default)]
pub struct Registry {
    nodes: IndexMap<NodeId, Node>,
    states: HashMap<NodeId, NodeState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register nodes built by the source/model registry. A duplicate id
    /// is a hard, fatal-for-the-stack error (malformed definition).
    pub fn collect(&mut self, nodes: Vec<Node>) -> Result<(), EngineError> {
        for node in nodes {
            if self.nodes.contains_key(&node.id) {
                return Err(EngineError::Duplicate(node.id));
            }
            self.nodes.insert(node.id.clone(), node);
        }
        Ok(())
    }

    /// Resolve dangling upstream ids into synthesized Orphan nodes.
    ///
    /// Idempotent (E2): re-running after nodes have already been backpatched
    /// does nothing, since every upstream id is by then already present.
    /// An id referenced as upstream from more than one node reuses the same
    /// Orphan entry (E1), since orphans live in the same id-keyed map as
    /// every other node.
    pub fn backpatch_upstream(&mut self) {
        let mut missing: Vec<NodeId> = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        for node in self.nodes.values() {
            for upstream_id in &node.upstream {
                if !self.nodes.contains_key(upstream_id) && seen.insert(upstream_id.clone()) {
                    missing.push(upstream_id.clone());
                }
            }
        }
        for id in missing {
            self.nodes
                .entry(id.clone())
                .or_insert_with(|| Node::orphan(id));
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current in-memory state cache. Orphans (including ids known only as
    /// dangling upstream references) are always `ORPHAN`.
    pub fn state_of(&self, id: &NodeId) -> NodeState {
        if let Some(node) = self.nodes.get(id) {
            if node.is_orphan {
                return NodeState::Orphan;
            }
        } else {
            return NodeState::Orphan;
        }
        self.states.get(id).copied().unwrap_or(NodeState::Stale)
    }

    /// Whether `id` counts as fresh for a downstream node's readiness check.
    pub fn is_fresh(&self, id: &NodeId) -> bool {
        self.state_of(id).is_fresh()
    }

    /// Seed persisted rows for every known id that doesn't have one yet, and
    /// load the persisted state for every known id into the in-memory
    /// cache (I2: the store is authoritative, this is only a cache).
    pub fn load_node_states(&mut self, store: &mut StateStore) -> Result<(), EngineError> {
        let ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.is_orphan)
            .map(|n| n.id.clone())
            .collect();

        let loaded = store.with_transaction(|state| {
            let mut events = Vec::new();
            let mut loaded = HashMap::new();
            for id in &ids {
                match state.node(id.as_str()) {
                    Some(record) => {
                        loaded.insert(id.clone(), record.state);
                    }
                    None => {
                        events.push(Event::NodeSeeded { id: id.clone() });
                        loaded.insert(id.clone(), NodeState::Stale);
                    }
                }
            }
            Ok((loaded, events))
        })?;

        self.states = loaded;
        Ok(())
    }

    /// Refresh a single node's persisted state. Returns `ORPHAN` if the id
    /// isn't known to the registry.
    pub fn load_node_state(
        &mut self,
        store: &mut StateStore,
        id: &NodeId,
    ) -> Result<NodeState, EngineError> {
        if !self.nodes.contains_key(id) || self.nodes.get(id).is_some_and(|n| n.is_orphan) {
            return Ok(NodeState::Orphan);
        }
        let state = store.with_read(|state| {
            state
                .node(id.as_str())
                .map(|r| r.state)
                .unwrap_or(NodeState::Stale)
        })?;
        self.states.insert(id.clone(), state);
        Ok(state)
    }

    /// Overwrite the in-memory state cache for a single id, used by the
    /// scheduler/cascade after a transaction it already ran so the rest of
    /// the same tick sees the fresh decision without a full reload.
    pub fn set_cached_state(&mut self, id: &NodeId, state: NodeState) {
        self.states.insert(id.clone(), state);
    }

    /// Transitive closure of nodes whose upstream chain contains `id`,
    /// deduplicated, in insertion order of first visit.
    pub fn downstream_nodes(&self, id: &NodeId) -> Vec<NodeId> {
        let mut reverse: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for node in self.nodes.values() {
            for upstream_id in &node.upstream {
                reverse.entry(upstream_id).or_default().push(&node.id);
            }
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut order: Vec<NodeId> = Vec::new();
        let mut queue: Vec<NodeId> = vec![id.clone()];
        let mut head = 0;

        while head < queue.len() {
            let current = queue[head].clone();
            head += 1;
            if let Some(children) = reverse.get(&current) {
                for child in children {
                    if visited.insert((*child).clone()) {
                        order.push((*child).clone());
                        queue.push((*child).clone());
                    }
                }
            }
        }

        order
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
