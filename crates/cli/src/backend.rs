// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the `Store` backend a data stack is configured to use
//! (`stores/store.toml`, defaulting to an in-memory store) into a boxed
//! trait object the engine can drive.

use anyhow::{Context, Result};
use do_definitions::StoreDef;
use do_stores::Store;
use std::path::Path;

pub fn open(data_stack_dir: &Path) -> Result<Box<dyn Store>> {
    let def = do_definitions::load_store(data_stack_dir)
        .with_context(|| format!("loading stores/store.toml under {}", data_stack_dir.display()))?;
    match def {
        StoreDef::Postgres { dsn } => connect_postgres(&dsn),
        StoreDef::Memory => Ok(Box::new(do_stores::MemoryStore::new())),
    }
}

#[cfg(feature = "postgres")]
fn connect_postgres(dsn: &str) -> Result<Box<dyn Store>> {
    Ok(Box::new(do_stores::PostgresStore::connect(dsn)?))
}

#[cfg(not(feature = "postgres"))]
fn connect_postgres(_dsn: &str) -> Result<Box<dyn Store>> {
    anyhow::bail!("this build was compiled without the `postgres` feature")
}
