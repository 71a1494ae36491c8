// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The action a node's refresher performs when invoked by a worker.
//!
//! Kept as a tagged variant rather than a trait object: the orchestrator
//! never calls into source/model code directly, it hands this value to
//! `do-stores` and lets the external collaborator interpret it.

use serde::{Deserialize, Serialize};

/// What happens when a node is refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefresherKind {
    /// A model: build-and-replace the target table from a SELECT.
    Sql { select_sql: String },
    /// A source: run an external command and hand the Store the records
    /// it produces on stdout.
    External { command: Vec<String> },
}
