// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` interface the orchestrator consumes from an external,
//! SQL-capable backend. Opaque to the core engine: the orchestrator never
//! interprets a refresher's SQL or records, it just hands them here.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// One row of a query result, column name -> value.
pub type Row = Map<String, Value>;

/// SQL-capable backend that materializes data-node tables.
pub trait Store: Send + Sync {
    /// Run an arbitrary statement, returning its rows.
    fn execute_sql(&self, stmt: &str) -> Result<Vec<Row>, StoreError>;

    /// Atomically build `schema.table` from `select_sql` and swap it in
    /// for the previous contents (build-then-rename, never a partial
    /// table visible to readers).
    fn create_or_replace_model(
        &self,
        schema: &str,
        table: &str,
        select_sql: &str,
    ) -> Result<(), StoreError>;

    /// Ingest opaque extracted records into `schema.table`, replacing any
    /// prior contents the same way as `create_or_replace_model`.
    fn load_raw_from_records(
        &self,
        schema: &str,
        table: &str,
        records: Vec<Row>,
    ) -> Result<(), StoreError>;

    /// Sample rows for UX/debugging.
    fn sample(
        &self,
        schema: &str,
        table: &str,
        limit: u32,
        order_by: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Vec<Row>, StoreError>;
}
