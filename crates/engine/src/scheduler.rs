// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tick loop (spec.md §4.4 and §4.7): for every node, either launch a
//! ready STALE node's refresh or expire a FRESH node whose TTL has elapsed,
//! plus a zombie sweep if any task is RUNNING.

use crate::cascade;
use crate::error::EngineError;
use crate::registry::Registry;
use crate::task_manager::TaskManager;
use crate::worker;
use do_core::{Clock, NodeId, NodeState};
use do_storage::StateStore;
use std::path::{Path, PathBuf};

/// Spawns the detached processes a tick decides to launch. Abstracted so
/// tests can observe decisions without forking real processes; the CLI's
/// [`ProcessSpawner`] is the production implementation.
pub trait WorkerSpawner {
    fn spawn_refresh(&self, nid: &NodeId, log_dir: &Path, force: bool) -> std::io::Result<()>;
    fn spawn_zombie_sweep(&self) -> std::io::Result<()>;
}

/// Forks the orchestrator binary itself as `__refresh-worker`/`__sweep-zombies`.
pub struct ProcessSpawner {
    pub exe: PathBuf,
    pub data_stack_dir: PathBuf,
}

impl WorkerSpawner for ProcessSpawner {
    fn spawn_refresh(&self, nid: &NodeId, log_dir: &Path, force: bool) -> std::io::Result<()> {
        worker::spawn_refresh_worker(&self.exe, &self.data_stack_dir, nid, log_dir, force)?;
        Ok(())
    }

    fn spawn_zombie_sweep(&self) -> std::io::Result<()> {
        worker::spawn_zombie_sweeper(&self.exe, &self.data_stack_dir)?;
        Ok(())
    }
}

/// What a single tick decided to do.
#[derive(Debug, Default)]
pub struct TickReport {
    pub log_dir: PathBuf,
    pub refreshed: Vec<NodeId>,
    pub staled: Vec<NodeId>,
    pub swept: bool,
}

pub struct Scheduler<C: Clock> {
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Run one tick. `registry` must already have fresh persisted state
    /// loaded (via [`Registry::load_node_states`]) — a tick only reads and
    /// updates the in-memory cache, it never reloads from the store itself.
    pub fn tick(
        &self,
        registry: &mut Registry,
        store: &mut StateStore,
        task_manager: &TaskManager<C>,
        spawner: &dyn WorkerSpawner,
        data_stack_dir: &Path,
    ) -> Result<TickReport, EngineError> {
        let now = self.clock.now();
        let log_dir = data_stack_dir.join("logs").join(format!(
            "{}-{}",
            now.format("%Y%m%dT%H%M%S%.3fZ"),
            uuid::Uuid::new_v4()
        ));

        let swept = self.maybe_sweep_zombies(store, spawner)?;

        let mut refreshed = Vec::new();
        let mut staled = Vec::new();

        let ids: Vec<NodeId> = registry
            .iter()
            .filter(|n| !n.is_orphan)
            .map(|n| n.id.clone())
            .collect();

        for id in ids {
            match registry.state_of(&id) {
                NodeState::Stale => {
                    if self.is_ready(registry, &id) {
                        spawner
                            .spawn_refresh(&id, &log_dir, false)
                            .map_err(|e| EngineError::Internal(e.to_string()))?;
                        refreshed.push(id);
                    }
                }
                NodeState::Orphan => {}
                _ => {
                    if self.has_expired(registry, store, task_manager, &id, now)? {
                        let changes = cascade::set_node_stale(store, registry, &id)?;
                        for (changed_id, new_state) in changes {
                            registry.set_cached_state(&changed_id, new_state);
                        }
                        staled.push(id);
                    }
                }
            }
        }

        Ok(TickReport {
            log_dir,
            refreshed,
            staled,
            swept,
        })
    }

    fn maybe_sweep_zombies(
        &self,
        store: &mut StateStore,
        spawner: &dyn WorkerSpawner,
    ) -> Result<bool, EngineError> {
        let any_running = store.with_read(|state| state.running_tasks().next().is_some())?;
        if !any_running {
            return Ok(false);
        }
        spawner
            .spawn_zombie_sweep()
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        Ok(true)
    }

    fn is_ready(&self, registry: &Registry, id: &NodeId) -> bool {
        registry
            .node(id)
            .map(|node| node.upstream.iter().all(|u| registry.is_fresh(u)))
            .unwrap_or(false)
    }

    fn has_expired(
        &self,
        registry: &Registry,
        store: &mut StateStore,
        task_manager: &TaskManager<C>,
        id: &NodeId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, EngineError> {
        let Some(stale_after) = registry.node(id).and_then(|n| n.stale_after) else {
            return Ok(false);
        };
        let last = task_manager.last_task_for_node(store, id)?;
        let next_refresh_at = last
            .map(|t| t.started_at + stale_after.as_duration())
            .unwrap_or(now);
        Ok(now >= next_refresh_at)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
