// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use do_core::test_support::{epoch, node_id, task_id, task_info};
use do_core::NodeState;
use tempfile::tempdir;

#[test]
fn transaction_appends_and_applies_events() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();

    store
        .with_transaction(|_state| {
            Ok(((), vec![Event::NodeSeeded { id: node_id("a") }]))
        })
        .unwrap();

    let state = store.with_read(|s| s.node("a").cloned()).unwrap();
    assert_eq!(state.unwrap().state, NodeState::Stale);
}

#[test]
fn empty_events_is_a_true_no_op() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    store
        .with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();

    // Second transaction observes a mismatch and decides to no-op.
    store
        .with_transaction(|state| {
            if state.node("a").unwrap().state != NodeState::Fresh {
                return Ok(((), vec![]));
            }
            unreachable!("precondition should have failed");
        })
        .unwrap();

    let state = store.with_read(|s| s.node("a").cloned()).unwrap();
    assert_eq!(state.unwrap().state, NodeState::Stale);
}

#[test]
fn reopening_recovers_state_from_wal_without_snapshot() {
    let dir = tempdir().unwrap();
    {
        let mut store = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
        store
            .with_transaction(|_| {
                Ok((
                    (),
                    vec![Event::TaskStarted {
                        nid: node_id("a"),
                        tid: task_id("t1"),
                        started_at: epoch(10),
                        info: task_info(7),
                    }],
                ))
            })
            .unwrap();
    }

    let mut reopened = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    let node = reopened.with_read(|s| s.node("a").cloned()).unwrap().unwrap();
    assert_eq!(node.state, NodeState::Refreshing);
}

#[test]
fn checkpoint_then_reopen_still_recovers_state() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    store
        .with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();
    store.checkpoint().unwrap();

    let mut reopened = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    let node = reopened.with_read(|s| s.node("a").cloned()).unwrap();
    assert_eq!(node.unwrap().state, NodeState::Stale);
}

#[test]
fn catches_up_on_events_appended_by_a_sibling_handle() {
    let dir = tempdir().unwrap();
    let mut a = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();
    let mut b = StateStore::open(dir.path(), MigrationRegistry::new()).unwrap();

    a.with_transaction(|_| Ok(((), vec![Event::NodeSeeded { id: node_id("a") }])))
        .unwrap();

    // `b` opened before `a`'s write; its next transaction must still see it.
    let seen = b
        .with_transaction(|state| Ok((state.node("a").is_some(), vec![])))
        .unwrap();
    assert!(seen);
}
