// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the orchestrator crates.

use serde::Serialize;
use thiserror::Error;

/// Orchestrator-level error kinds, independent of the crate that raises them.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("store busy: {0}")]
    StoreBusy(String),

    #[error("refresher failed: {error}")]
    RefresherFailure {
        error: String,
        traceback: Option<String>,
    },

    #[error("malformed definition: {0}")]
    MalformedDefinition(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Stable machine-readable code for this error kind, used in `ErrorPayload`.
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::NotFound(_) => "not_found",
            OrchestratorError::InvalidState(_) => "invalid_state",
            OrchestratorError::StoreBusy(_) => "store_busy",
            OrchestratorError::RefresherFailure { .. } => "refresher_failure",
            OrchestratorError::MalformedDefinition(_) => "malformed_definition",
            OrchestratorError::Internal(_) => "internal",
        }
    }
}

/// Structured error payload returned at CLI/HTTP boundaries (see external
/// interface error contract).
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&OrchestratorError> for ErrorPayload {
    fn from(err: &OrchestratorError) -> Self {
        let source = match err {
            OrchestratorError::RefresherFailure { traceback, .. } => traceback.clone(),
            _ => None,
        };
        ErrorPayload {
            code: err.code().to_string(),
            details: err.to_string(),
            source,
        }
    }
}
