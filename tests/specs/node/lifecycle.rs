use crate::prelude::Stack;

#[test]
fn refresh_forces_an_immediate_synchronous_refresh() {
    let stack = Stack::new();
    stack.source("a", &[], None);

    // Before any tick, refresh runs inline and blocks until done.
    stack
        .cmd(&["node", "refresh", "a"])
        .assert()
        .success()
        .stdout(predicates::str::contains("a"));

    assert_eq!(stack.node_state("a"), "FRESH");
}

#[test]
fn delete_removes_the_persisted_row_and_a_later_tick_reseeds_it_stale() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.cmd(&["node", "refresh", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "FRESH");

    stack.cmd(&["node", "delete", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "ORPHAN");

    stack.tick().success();
    assert_eq!(stack.node_state("a"), "STALE");
}

#[test]
fn nodes_listing_includes_every_known_node_and_its_last_task() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.source("b", &["a"], None);
    stack.cmd(&["node", "refresh", "a"]).assert().success();

    let nodes = stack.nodes_json();
    let arr = nodes.as_array().unwrap();
    assert_eq!(arr.len(), 2);

    let a = arr.iter().find(|n| n["id"] == "a").unwrap();
    assert_eq!(a["state"], "FRESH");
    assert_eq!(a["last_task"]["state"], "DONE");

    let b = arr.iter().find(|n| n["id"] == "b").unwrap();
    assert_eq!(b["state"], "STALE");
    assert!(b["last_task"].is_null());
}
