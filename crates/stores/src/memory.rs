// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Store` for tests, behind the `test-support` feature. Mirrors
//! the trait-plus-fake convention used throughout the corpus for external
//! collaborators: a real implementation plus a `Fake*` double with the
//! same contract.

use crate::{Row, Store, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<(String, String), Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current contents of a table (test helper).
    pub fn table(&self, schema: &str, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn execute_sql(&self, _stmt: &str) -> Result<Vec<Row>, StoreError> {
        Ok(Vec::new())
    }

    fn create_or_replace_model(
        &self,
        schema: &str,
        table: &str,
        _select_sql: &str,
    ) -> Result<(), StoreError> {
        self.tables
            .lock()
            .insert((schema.to_string(), table.to_string()), Vec::new());
        Ok(())
    }

    fn load_raw_from_records(
        &self,
        schema: &str,
        table: &str,
        records: Vec<Row>,
    ) -> Result<(), StoreError> {
        self.tables
            .lock()
            .insert((schema.to_string(), table.to_string()), records);
        Ok(())
    }

    fn sample(
        &self,
        schema: &str,
        table: &str,
        limit: u32,
        _order_by: Option<&str>,
        _filter: Option<&str>,
    ) -> Result<Vec<Row>, StoreError> {
        let rows = self.table(schema, table);
        Ok(rows.into_iter().take(limit as usize).collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
