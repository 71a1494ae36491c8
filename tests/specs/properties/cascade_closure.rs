use crate::prelude::{wait_until, Stack};

/// `set_node_stale` on a mid-chain node stales its entire transitive
/// downstream closure, and leaves every node outside that closure alone.
#[test]
fn staling_a_node_only_affects_its_downstream_closure() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.source("b", &["a"], None);
    stack.source("c", &["b"], None);
    stack.source("unrelated", &[], None);

    // Drive the whole chain (plus the unrelated node) to FRESH, one tick
    // per dependency level.
    for node in ["a", "b", "c", "unrelated"] {
        stack.tick().success();
        assert!(wait_until(|| stack.node_state(node) == "FRESH"), "{node} never went FRESH");
    }

    stack.cmd(&["node", "set-stale", "b"]).assert().success();

    assert_eq!(stack.node_state("a"), "FRESH");
    assert_eq!(stack.node_state("b"), "STALE");
    assert_eq!(stack.node_state("c"), "STALE");
    assert_eq!(stack.node_state("unrelated"), "FRESH");
}
