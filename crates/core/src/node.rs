// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data node state machine.

use crate::id::{NodeId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a data node.
///
/// A node never moves FRESH → REFRESHING directly; it must pass through
/// STALE (or REFRESHING_STALE, which collapses back to STALE on completion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    Stale,
    Fresh,
    Expired,
    Refreshing,
    RefreshingStale,
    Orphan,
}

impl NodeState {
    /// Whether a node in this state counts as "fresh" for readiness checks.
    /// Orphans are never fresh.
    pub fn is_fresh(self) -> bool {
        matches!(self, NodeState::Fresh)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Stale => "STALE",
            NodeState::Fresh => "FRESH",
            NodeState::Expired => "EXPIRED",
            NodeState::Refreshing => "REFRESHING",
            NodeState::RefreshingStale => "REFRESHING_STALE",
            NodeState::Orphan => "ORPHAN",
        };
        write!(f, "{s}")
    }
}

/// Persisted record for a single data node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub state: NodeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tid: Option<TaskId>,
}

impl NodeRecord {
    pub fn seeded(id: NodeId) -> Self {
        Self {
            id,
            state: NodeState::Stale,
            current_tid: None,
        }
    }

    pub fn orphan(id: NodeId) -> Self {
        Self {
            id,
            state: NodeState::Orphan,
            current_tid: None,
        }
    }
}

/// A node descriptor as built by the registry from source/model definitions.
///
/// Descriptors are exclusively owned by the registry for their in-memory
/// lifetime; persisted state lives separately in the state store.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub container: String,
    /// Resolved upstream node ids, in declared order, deduplicated.
    pub upstream: Vec<NodeId>,
    pub details: serde_json::Value,
    pub stale_after: Option<crate::stale_after::StaleAfter>,
    pub is_orphan: bool,
}

impl Node {
    pub fn orphan(id: NodeId) -> Self {
        Self {
            id,
            container: String::new(),
            upstream: Vec::new(),
            details: serde_json::Value::Null,
            stale_after: None,
            is_orphan: true,
        }
    }
}
