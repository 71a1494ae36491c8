// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::catalog::RefresherBinding;
use crate::registry::Registry;
use crate::task_manager::TaskManager;
use do_core::test_support::{epoch, node_id, task_info};
use do_core::{FakeClock, Node};
use do_definitions::RefresherKind;
use do_storage::MigrationRegistry;
use do_stores::MemoryStore;
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, StateStore) {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    (dir, store)
}

fn linear_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .collect(vec![
            Node {
                id: node_id("a"),
                container: "source:a".into(),
                upstream: vec![],
                details: serde_json::Value::Null,
                stale_after: None,
                is_orphan: false,
            },
            Node {
                id: node_id("b"),
                container: "model:b".into(),
                upstream: vec![node_id("a")],
                details: serde_json::Value::Null,
                stale_after: None,
                is_orphan: false,
            },
            Node {
                id: node_id("c"),
                container: "model:c".into(),
                upstream: vec![node_id("b")],
                details: serde_json::Value::Null,
                stale_after: None,
                is_orphan: false,
            },
        ])
        .unwrap();
    registry
}

fn seed_fresh(store: &mut StateStore, id: &do_core::NodeId) {
    store
        .with_transaction(|_| {
            Ok((
                (),
                vec![
                    Event::NodeSeeded { id: id.clone() },
                    Event::NodeStateSet {
                        id: id.clone(),
                        state: NodeState::Fresh,
                    },
                ],
            ))
        })
        .unwrap();
}

#[test]
fn set_node_stale_cascades_to_every_downstream_node() {
    let (_dir, mut store) = store();
    let registry = linear_registry();
    seed_fresh(&mut store, &node_id("a"));
    seed_fresh(&mut store, &node_id("b"));
    seed_fresh(&mut store, &node_id("c"));

    let changes = set_node_stale(&mut store, &registry, &node_id("a")).unwrap();
    assert_eq!(changes.len(), 3);

    for id in ["a", "b", "c"] {
        let node = store.with_read(|s| s.node(id).cloned()).unwrap().unwrap();
        assert_eq!(node.state, NodeState::Stale);
    }
}

#[test]
fn set_node_stale_on_refreshing_node_produces_refreshing_stale() {
    let (_dir, mut store) = store();
    let registry = linear_registry();
    let tm = TaskManager::new(FakeClock::new(epoch(1000)));
    seed_fresh(&mut store, &node_id("a"));
    store
        .with_transaction(|_| {
            Ok((
                (),
                vec![Event::NodeStateSet {
                    id: node_id("a"),
                    state: NodeState::Stale,
                }],
            ))
        })
        .unwrap();
    tm.start_task(&mut store, &node_id("a"), task_info(1)).unwrap();

    set_node_stale(&mut store, &registry, &node_id("a")).unwrap();

    let node = store.with_read(|s| s.node("a").cloned()).unwrap().unwrap();
    assert_eq!(node.state, NodeState::RefreshingStale);
}

#[test]
fn set_node_stale_is_a_no_op_on_an_already_stale_node() {
    let (_dir, mut store) = store();
    let registry = linear_registry();
    store
        .with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();

    let changes = set_node_stale(&mut store, &registry, &node_id("a")).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn delete_node_removes_the_persisted_row() {
    let (_dir, mut store) = store();
    store
        .with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();

    delete_node(&mut store, &node_id("a")).unwrap();

    let node = store.with_read(|s| s.node("a").cloned()).unwrap();
    assert!(node.is_none());
}

#[test]
fn refresh_node_forces_a_refresh_and_returns_the_completed_task() {
    let (_dir, mut store) = store();
    let tm = TaskManager::new(FakeClock::new(epoch(1000)));
    let backend = MemoryStore::new();
    let binding = RefresherBinding {
        schema: "analytics".into(),
        table: "orders".into(),
        kind: RefresherKind::Sql {
            select_sql: "select 1".into(),
        },
    };
    store
        .with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();

    let task = refresh_node(
        &mut store,
        &tm,
        &binding,
        &backend,
        &node_id("a"),
        task_info(42),
    )
    .unwrap();

    assert_eq!(task.state, do_core::TaskState::Done);
    assert_eq!(backend.table("analytics", "orders").len(), 0);
}
