// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use do_core::test_support::node_id;
use do_storage::MigrationRegistry;
use tempfile::tempdir;

fn node(id: &str, upstream: &[&str]) -> Node {
    Node {
        id: node_id(id),
        container: String::new(),
        upstream: upstream.iter().map(|s| node_id(s)).collect(),
        details: serde_json::Value::Null,
        stale_after: None,
        is_orphan: false,
    }
}

#[test]
fn collect_rejects_duplicate_ids() {
    let mut registry = Registry::new();
    registry.collect(vec![node("a", &[])]).unwrap();
    let err = registry.collect(vec![node("a", &[])]).unwrap_err();
    assert!(matches!(err, EngineError::Duplicate(_)));
}

#[test]
fn backpatch_synthesizes_orphan_for_dangling_upstream() {
    let mut registry = Registry::new();
    registry
        .collect(vec![node("b", &["a"]), node("c", &["a"])])
        .unwrap();
    registry.backpatch_upstream();

    let orphan = registry.node(&node_id("a")).expect("orphan synthesized");
    assert!(orphan.is_orphan);
    assert!(!registry.is_fresh(&node_id("a")));
}

#[test]
fn backpatch_is_idempotent() {
    let mut registry = Registry::new();
    registry.collect(vec![node("b", &["a"])]).unwrap();
    registry.backpatch_upstream();
    registry.backpatch_upstream();
    assert_eq!(registry.len(), 2);
}

#[test]
fn downstream_nodes_is_transitive_and_deduplicated() {
    let mut registry = Registry::new();
    registry
        .collect(vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["b"]),
            node("d", &["b", "c"]),
        ])
        .unwrap();
    registry.backpatch_upstream();

    let downstream = registry.downstream_nodes(&node_id("a"));
    let mut ids: Vec<&str> = downstream.iter().map(|n| n.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["b", "c", "d"]);
}

#[test]
fn load_node_states_seeds_stale_for_new_ids() {
    let dir = tempdir().unwrap();
    let mut store = do_storage::StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();

    let mut registry = Registry::new();
    registry.collect(vec![node("a", &[])]).unwrap();
    registry.backpatch_upstream();
    registry.load_node_states(&mut store).unwrap();

    assert_eq!(registry.state_of(&node_id("a")), NodeState::Stale);
}

#[test]
fn load_node_state_returns_orphan_for_unknown_id() {
    let dir = tempdir().unwrap();
    let mut store = do_storage::StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    let mut registry = Registry::new();
    let state = registry
        .load_node_state(&mut store, &node_id("ghost"))
        .unwrap();
    assert_eq!(state, NodeState::Orphan);
}
