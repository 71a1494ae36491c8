use crate::prelude::{wait_until, Stack};

/// A has no upstream, B depends on A. Both start STALE; one tick refreshes
/// A only (B isn't ready yet); once A completes, a later tick refreshes B.
#[test]
fn refreshes_in_dependency_order() {
    let stack = Stack::new();
    stack.source("a", &[], None);
    stack.source("b", &["a"], None);

    assert_eq!(stack.node_state("a"), "STALE");
    assert_eq!(stack.node_state("b"), "STALE");

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "FRESH"));
    // B can't have been launched yet: A wasn't fresh at tick time.
    assert_ne!(stack.node_state("b"), "FRESH");

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("b") == "FRESH"));
    assert_eq!(stack.node_state("a"), "FRESH");
}
