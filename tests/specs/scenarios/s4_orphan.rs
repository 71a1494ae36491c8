use crate::prelude::Stack;

/// A node that names an unknown upstream id gets a synthesized ORPHAN node
/// standing in for it; the dependent node is never refreshed.
#[test]
fn dangling_upstream_becomes_orphan() {
    let stack = Stack::new();
    stack.model("m", "c", &["does-not-exist"]);

    assert_eq!(stack.node_state("does-not-exist"), "ORPHAN");
    assert_eq!(stack.node_state("m.c"), "STALE");

    for _ in 0..3 {
        stack.tick().success();
    }

    assert_eq!(stack.node_state("m.c"), "STALE");
    assert_eq!(stack.node_state("does-not-exist"), "ORPHAN");
}
