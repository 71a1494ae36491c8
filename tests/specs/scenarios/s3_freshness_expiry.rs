use crate::prelude::{wait_until, Stack};
use std::thread::sleep;
use std::time::Duration;

/// A node with `stale_after = "1s"` expires back to STALE on the first
/// tick at or after its deadline, cascading to its downstream.
#[test]
fn stale_after_expires_and_cascades() {
    let stack = Stack::new();
    stack.source("a", &[], Some("1s"));
    stack.source("b", &["a"], None);

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "FRESH"));
    stack.tick().success();
    assert!(wait_until(|| stack.node_state("b") == "FRESH"));

    sleep(Duration::from_secs(2));

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "STALE"));
    assert_eq!(stack.node_state("b"), "STALE");
}
