// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable, cross-process state store for the data orchestrator.

mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{Event, MaterializedState, CURRENT_SNAPSHOT_VERSION};
pub use store::{StateStore, StoreError};
pub use wal::{Wal, WalEntry, WalError};
