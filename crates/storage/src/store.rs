// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process transactional access to the materialized state.
//!
//! Multiple independent OS processes — the tick loop, refresh workers, the
//! zombie sweeper — all mutate the same on-disk state. `fs2`'s advisory
//! file lock stands in for the transactional guarantees a single-process
//! daemon would get for free from an in-memory mutex: every mutation takes
//! the exclusive lock, catches up on any events a sibling process appended
//! while it wasn't looking, runs the caller's decision closure against that
//! fresh state, and only then appends + applies the resulting events.

use crate::migration::MigrationRegistry;
use crate::{Event, MaterializedState, Snapshot, SnapshotError, Wal, WalError, CURRENT_SNAPSHOT_VERSION};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const LOCK_RETRY_ATTEMPTS: u32 = 5;
const LOCK_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Checkpoint (snapshot + WAL truncation) once this many events have
/// accumulated since the last one.
const CHECKPOINT_THRESHOLD: u64 = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Migration(#[from] crate::migration::MigrationError),
    #[error("store busy: lock held by another process after {0} attempts")]
    Busy(u32),
    #[error("{0}")]
    Caller(String),
}

/// Durable, multi-process-safe state store for a data stack.
///
/// Layout under `<data-stack-dir>/orchestrator/`:
/// - `state.wal`      — JSONL event log
/// - `state.snapshot` — materialized state + seq watermark (zstd-compressed)
/// - `state.lock`     — empty file used purely as an `fs2` advisory lock
pub struct StateStore {
    dir: PathBuf,
    lock_path: PathBuf,
    wal: Wal,
    state: MaterializedState,
    /// Highest WAL seq reflected in `state`.
    applied_seq: u64,
    /// Seq at which the last snapshot was taken.
    snapshot_seq: u64,
}

impl StateStore {
    /// Open (or initialize) the state store rooted at `<data_stack_dir>/orchestrator/`.
    pub fn open(data_stack_dir: &Path, migrations: MigrationRegistry) -> Result<Self, StoreError> {
        let dir = data_stack_dir.join("orchestrator");
        std::fs::create_dir_all(&dir)?;

        let lock_path = dir.join("state.lock");
        OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;

        let snapshot_path = dir.join("state.snapshot");
        let wal_path = dir.join("state.wal");

        let (mut state, snapshot_seq) = match Snapshot::load(&snapshot_path)? {
            Some(snap) => {
                let migrated = migrations.migrate_to(
                    serde_json::to_value(&snap.state).map_err(WalError::from)?,
                    CURRENT_SNAPSHOT_VERSION,
                )?;
                let state: MaterializedState =
                    serde_json::from_value(migrated).map_err(WalError::from)?;
                (state, snap.seq)
            }
            None => (MaterializedState::default(), 0),
        };

        let wal = Wal::open(&wal_path)?;
        for entry in wal.entries_after(snapshot_seq)? {
            state.apply_event(&entry.event);
        }
        let applied_seq = wal.write_seq();

        Ok(Self {
            dir,
            lock_path,
            wal,
            state,
            applied_seq,
            snapshot_seq,
        })
    }

    fn acquire_exclusive(&self) -> Result<File, StoreError> {
        let file = OpenOptions::new().write(true).open(&self.lock_path)?;
        let mut attempt = 0;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    attempt += 1;
                    if attempt >= LOCK_RETRY_ATTEMPTS {
                        return Err(StoreError::Busy(attempt));
                    }
                    thread::sleep(LOCK_RETRY_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn acquire_shared(&self) -> Result<File, StoreError> {
        let file = OpenOptions::new().read(true).open(&self.lock_path)?;
        let mut attempt = 0;
        loop {
            match file.try_lock_shared() {
                Ok(()) => return Ok(file),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    attempt += 1;
                    if attempt >= LOCK_RETRY_ATTEMPTS {
                        return Err(StoreError::Busy(attempt));
                    }
                    thread::sleep(LOCK_RETRY_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Replay WAL entries appended by sibling processes since we last looked.
    fn catch_up(&mut self) -> Result<(), StoreError> {
        let wal_path = self.dir.join("state.wal");
        // Re-open to see sibling appends; our own `self.wal` handle's read
        // view is only guaranteed fresh immediately after open.
        let fresh = Wal::open(&wal_path)?;
        for entry in fresh.entries_after(self.applied_seq)? {
            self.state.apply_event(&entry.event);
            self.applied_seq = self.applied_seq.max(entry.seq);
        }
        self.wal = fresh;
        Ok(())
    }

    /// Run a read-only decision against a consistent snapshot of the state,
    /// then durably append and apply whatever events it decides on.
    ///
    /// `f` receives the freshly caught-up state and returns `(result,
    /// events)`; an empty `events` vec is a legitimate no-op (used for
    /// idempotent preconditions like "only complete if `current_tid`
    /// still matches").
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&MaterializedState) -> Result<(T, Vec<Event>), StoreError>,
    {
        let lock = self.acquire_exclusive()?;
        let result = (|| {
            self.catch_up()?;
            let (value, events) = f(&self.state)?;
            for event in &events {
                let seq = self.wal.append(event)?;
                self.state.apply_event(event);
                self.applied_seq = seq;
            }
            Ok(value)
        })();
        lock.unlock().ok();
        let value = result?;
        if self.applied_seq.saturating_sub(self.snapshot_seq) >= CHECKPOINT_THRESHOLD {
            if let Err(e) = self.checkpoint() {
                debug!(error = %e, "checkpoint attempt failed, will retry on next threshold");
            }
        }
        Ok(value)
    }

    /// Run a read-only query against a consistent (caught-up) snapshot.
    pub fn with_read<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&MaterializedState) -> T,
    {
        let lock = self.acquire_shared()?;
        self.catch_up()?;
        let value = f(&self.state);
        lock.unlock().ok();
        Ok(value)
    }

    /// Snapshot the current state and truncate the WAL before it. Safe to
    /// call at any time; a crash mid-checkpoint leaves the prior snapshot
    /// and full WAL intact, so recovery just replays more entries.
    pub fn checkpoint(&mut self) -> Result<(), StoreError> {
        let snapshot_path = self.dir.join("state.snapshot");
        Snapshot::new(self.applied_seq, self.state.clone()).save(&snapshot_path)?;
        self.wal.truncate_before(self.applied_seq)?;
        self.snapshot_seq = self.applied_seq;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
