// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error type, wrapping the store/definition error taxonomies
//! into the kinds spec.md §7 names.

use do_core::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("node not found: {0}")]
    NotFound(NodeId),

    #[error("node {0} is not STALE")]
    NotStale(NodeId),

    #[error("duplicate node id in registry: {0}")]
    Duplicate(NodeId),

    #[error(transparent)]
    Store(#[from] do_storage::StoreError),

    #[error(transparent)]
    Definition(#[from] do_definitions::ParseError),

    #[error(transparent)]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("refresher failed: {error}")]
    RefresherFailure {
        error: String,
        traceback: Option<String>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::NotStale(_) => "invalid_state",
            EngineError::Duplicate(_) => "malformed_definition",
            EngineError::Store(do_storage::StoreError::Busy(_)) => "store_busy",
            EngineError::Store(_) => "internal",
            EngineError::Definition(_) => "malformed_definition",
            EngineError::Catalog(_) => "malformed_definition",
            EngineError::RefresherFailure { .. } => "refresher_failure",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl From<&EngineError> for do_core::ErrorPayload {
    fn from(err: &EngineError) -> Self {
        let source = match err {
            EngineError::RefresherFailure { traceback, .. } => traceback.clone(),
            _ => None,
        };
        do_core::ErrorPayload {
            code: err.code().to_string(),
            details: err.to_string(),
            source,
        }
    }
}
