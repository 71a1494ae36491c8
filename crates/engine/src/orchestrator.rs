// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: the single entry point a CLI or embedder drives,
//! wrapping the registry, state store, task manager, and scheduler behind
//! the public surface spec.md §2 names (`tick`, `set_node_stale`,
//! `refresh_node`, `delete_node`, `info`, `last_task_for_node`).

use crate::cascade;
use crate::catalog::{self, Catalog, RefresherBinding};
use crate::error::EngineError;
use crate::registry::Registry;
use crate::scheduler::{ProcessSpawner, Scheduler, TickReport};
use crate::task_manager::TaskManager;
use do_core::{Clock, Node, NodeId, NodeState, Task, TaskInfo};
use do_storage::{MigrationRegistry, StateStore};
use do_stores::Store;
use std::path::{Path, PathBuf};

/// A node's resolved state plus enough static metadata to render `do node info`.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub state: NodeState,
    pub container: String,
    pub upstream: Vec<NodeId>,
    pub stale_after: Option<do_core::StaleAfter>,
    pub current_tid: Option<do_core::TaskId>,
    pub last_task: Option<Task>,
}

pub struct Orchestrator<C: Clock> {
    data_stack_dir: PathBuf,
    exe: PathBuf,
    store: StateStore,
    registry: Registry,
    catalog: Catalog,
    task_manager: TaskManager<C>,
    scheduler: Scheduler<C>,
    backend: Box<dyn Store>,
}

impl<C: Clock> Orchestrator<C> {
    /// Load a data stack's source/model definitions, open its state store,
    /// and build the in-memory registry. `exe` is the orchestrator binary's
    /// own path, used to fork `__refresh-worker`/`__sweep-zombies`.
    pub fn open(
        data_stack_dir: PathBuf,
        exe: PathBuf,
        backend: Box<dyn Store>,
        clock: C,
        migrations: MigrationRegistry,
    ) -> Result<Self, EngineError> {
        let sources = do_definitions::load_sources(&data_stack_dir)?;
        let models = do_definitions::load_models(&data_stack_dir)?;
        let catalog = catalog::build_catalog(&sources, &models)?;

        let mut registry = Registry::new();
        registry.collect(catalog.nodes.clone())?;
        registry.backpatch_upstream();

        let mut store = StateStore::open(&data_stack_dir, migrations)?;
        registry.load_node_states(&mut store)?;

        Ok(Self {
            data_stack_dir,
            exe,
            store,
            registry,
            catalog,
            task_manager: TaskManager::new(clock.clone()),
            scheduler: Scheduler::new(clock),
            backend,
        })
    }

    /// Run one scheduling pass.
    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        let spawner = ProcessSpawner {
            exe: self.exe.clone(),
            data_stack_dir: self.data_stack_dir.clone(),
        };
        self.scheduler.tick(
            &mut self.registry,
            &mut self.store,
            &self.task_manager,
            &spawner,
            &self.data_stack_dir,
        )
    }

    /// Manually invalidate a node and its downstream closure.
    pub fn set_node_stale(&mut self, id: &NodeId) -> Result<(), EngineError> {
        self.require_known(id)?;
        let changes = cascade::set_node_stale(&mut self.store, &self.registry, id)?;
        for (changed_id, new_state) in changes {
            self.registry.set_cached_state(&changed_id, new_state);
        }
        Ok(())
    }

    /// Force an immediate, synchronous refresh of `id` regardless of its
    /// current state, running the refresher inline in this process.
    pub fn refresh_node(&mut self, id: &NodeId, pid: u32) -> Result<Task, EngineError> {
        self.require_known(id)?;
        let binding = self.binding_for(id)?;
        let info = TaskInfo {
            pid,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            traceback: None,
        };
        let task = cascade::refresh_node(
            &mut self.store,
            &self.task_manager,
            binding,
            self.backend.as_ref(),
            id,
            info,
        )?;
        let state = self.registry.load_node_state(&mut self.store, id)?;
        self.registry.set_cached_state(id, state);
        Ok(task)
    }

    /// Entry point for the detached `__refresh-worker` subprocess: start (or
    /// force-start) `id`'s task under `pid`, run its refresher, and
    /// complete/fail it. Returns `Ok(None)` when `force` is false and the
    /// node wasn't STALE by the time this worker got to it.
    pub fn run_worker_refresh(
        &mut self,
        id: &NodeId,
        info: TaskInfo,
        force: bool,
    ) -> Result<Option<Task>, EngineError> {
        self.require_known(id)?;
        let binding = self.binding_for(id)?;
        let result = crate::worker::execute_refresh(
            &mut self.store,
            &self.task_manager,
            binding,
            self.backend.as_ref(),
            id,
            info,
            force,
        )?;
        let state = self.registry.load_node_state(&mut self.store, id)?;
        self.registry.set_cached_state(id, state);
        Ok(result)
    }

    /// Entry point for the detached `__sweep-zombies` subprocess: reclaim
    /// every RUNNING task whose process is no longer alive.
    pub fn sweep_zombies(
        &mut self,
        process_exists: impl Fn(u32) -> bool,
    ) -> Result<Vec<do_core::TaskId>, EngineError> {
        let reclaimed = self.task_manager.sweep_zombies(&mut self.store, process_exists)?;
        self.registry.load_node_states(&mut self.store)?;
        Ok(reclaimed)
    }

    /// Remove a node's persisted row. A later tick reseeds it STALE if the
    /// node is still present in the registry's static definitions.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<(), EngineError> {
        self.require_known(id)?;
        cascade::delete_node(&mut self.store, id)?;
        self.registry.set_cached_state(id, NodeState::Orphan);
        Ok(())
    }

    /// Resolved state plus static metadata for a single node.
    pub fn info(&mut self, id: &NodeId) -> Result<NodeInfo, EngineError> {
        let node = self.registry.node(id).ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let node: Node = node.clone();
        let state = self.registry.load_node_state(&mut self.store, id)?;
        let last_task = self.task_manager.last_task_for_node(&mut self.store, id)?;
        let current_tid = last_task
            .as_ref()
            .filter(|t| t.state == do_core::TaskState::Running)
            .map(|t| t.id.clone());
        Ok(NodeInfo {
            id: node.id,
            state,
            container: node.container,
            upstream: node.upstream,
            stale_after: node.stale_after,
            current_tid,
            last_task,
        })
    }

    /// Newest task row for a node, if one exists.
    pub fn last_task_for_node(&mut self, id: &NodeId) -> Result<Option<Task>, EngineError> {
        self.require_known(id)?;
        self.task_manager.last_task_for_node(&mut self.store, id)
    }

    /// Every node currently known to the registry, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.registry.iter()
    }

    pub fn refresher_binding(&self, id: &NodeId) -> Option<&RefresherBinding> {
        self.catalog.refreshers.get(id)
    }

    fn binding_for(&self, id: &NodeId) -> Result<&RefresherBinding, EngineError> {
        self.catalog
            .refreshers
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    fn require_known(&self, id: &NodeId) -> Result<(), EngineError> {
        if self.registry.node(id).is_some() {
            Ok(())
        } else {
            Err(EngineError::NotFound(id.clone()))
        }
    }

    pub fn data_stack_dir(&self) -> &Path {
        &self.data_stack_dir
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
