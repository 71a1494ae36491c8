use crate::prelude::{wait_until, Stack};

/// After A and B are both FRESH, manually staling A cascades to B; two
/// ticks bring both back to FRESH.
#[test]
fn set_stale_cascades_and_recovers() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.source("b", &["a"], None);

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "FRESH"));
    stack.tick().success();
    assert!(wait_until(|| stack.node_state("b") == "FRESH"));

    stack.cmd(&["node", "set-stale", "a"]).assert().success();
    assert_eq!(stack.node_state("a"), "STALE");
    assert_eq!(stack.node_state("b"), "STALE");

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "FRESH"));
    stack.tick().success();
    assert!(wait_until(|| stack.node_state("b") == "FRESH"));
}
