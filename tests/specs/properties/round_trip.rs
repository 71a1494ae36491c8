use crate::prelude::Stack;

/// Every CLI invocation opens a fresh `StateStore` over the same WAL/
/// snapshot files; state survives across process boundaries with no
/// lingering in-memory cache to fall back on.
#[test]
fn state_survives_across_separate_invocations() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.source("b", &["a"], None);

    stack.cmd(&["node", "refresh", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "FRESH");

    stack.cmd(&["node", "set-stale", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "STALE");
    assert_eq!(stack.node_state("b"), "STALE");

    stack.cmd(&["node", "refresh", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "FRESH");
    // b was staled by an earlier, now-closed process; that transition must
    // have been durably persisted, not lost with the process that made it.
    assert_eq!(stack.node_state("b"), "STALE");
}
