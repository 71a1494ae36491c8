// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed `Store`: the same synchronous `postgres` client used
//! elsewhere in the pack for store-adjacent work, swapping tables by
//! building into a `__new` suffixed table and renaming inside one SQL
//! transaction so readers never observe a partially populated table.

use crate::{Row, Store, StoreError};
use parking_lot::Mutex;
use postgres::{Client, NoTls};
use serde_json::Value;

pub struct PostgresStore {
    client: Mutex<Client>,
}

impl PostgresStore {
    pub fn connect(dsn: &str) -> Result<Self, StoreError> {
        let client = Client::connect(dsn, NoTls)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }

    fn quoted(schema: &str, table: &str) -> String {
        format!("\"{schema}\".\"{table}\"")
    }
}

fn row_to_map(row: &postgres::Row) -> Row {
    let mut map = serde_json::Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value: Value = pg_value(row, i);
        map.insert(column.name().to_string(), value);
    }
    map
}

/// Best-effort column decode covering the value kinds spec.md §6 lists:
/// strings, integers, floats, booleans, ISO-8601 timestamps, null.
fn pg_value(row: &postgres::Row, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<_, Option<String>>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<_, Option<i64>>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<_, Option<f64>>(idx) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<_, Option<bool>>(idx) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx) {
        return v
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

impl Store for PostgresStore {
    fn execute_sql(&self, stmt: &str) -> Result<Vec<Row>, StoreError> {
        let mut client = self.client.lock();
        let rows = client
            .query(stmt, &[])
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    fn create_or_replace_model(
        &self,
        schema: &str,
        table: &str,
        select_sql: &str,
    ) -> Result<(), StoreError> {
        let new_table = format!("{table}__new");
        let mut client = self.client.lock();
        let mut txn = client
            .transaction()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        txn.batch_execute(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
            .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "CREATE TABLE {} AS {select_sql}",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            Self::quoted(schema, table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "ALTER TABLE {} RENAME TO \"{table}\"",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;

        txn.commit().map_err(|e| StoreError::Query(e.to_string()))
    }

    fn load_raw_from_records(
        &self,
        schema: &str,
        table: &str,
        records: Vec<Row>,
    ) -> Result<(), StoreError> {
        let new_table = format!("{table}__new");
        let columns: Vec<String> = records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();

        let mut client = self.client.lock();
        let mut txn = client
            .transaction()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        txn.batch_execute(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
            .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let column_defs = columns
            .iter()
            .map(|c| format!("\"{c}\" jsonb"))
            .collect::<Vec<_>>()
            .join(", ");
        txn.batch_execute(&format!(
            "CREATE TABLE {} ({column_defs})",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;

        for record in &records {
            let values: Vec<String> = columns
                .iter()
                .map(|c| {
                    let v = record.get(c).cloned().unwrap_or(Value::Null);
                    format!("'{}'::jsonb", v)
                })
                .collect();
            txn.batch_execute(&format!(
                "INSERT INTO {} VALUES ({})",
                Self::quoted(schema, &new_table),
                values.join(", ")
            ))
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        txn.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            Self::quoted(schema, table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;
        txn.batch_execute(&format!(
            "ALTER TABLE {} RENAME TO \"{table}\"",
            Self::quoted(schema, &new_table)
        ))
        .map_err(|e| StoreError::Query(e.to_string()))?;

        txn.commit().map_err(|e| StoreError::Query(e.to_string()))
    }

    fn sample(
        &self,
        schema: &str,
        table: &str,
        limit: u32,
        order_by: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut stmt = format!("SELECT * FROM {}", Self::quoted(schema, table));
        if let Some(where_clause) = filter {
            stmt.push_str(&format!(" WHERE {where_clause}"));
        }
        if let Some(order) = order_by {
            stmt.push_str(&format!(" ORDER BY {order}"));
        }
        stmt.push_str(&format!(" LIMIT {limit}"));
        self.execute_sql(&stmt)
    }
}
