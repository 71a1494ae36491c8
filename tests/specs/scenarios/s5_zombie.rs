use crate::prelude::{wait_until, Stack};

/// Killing a refresh worker's process leaves its task RUNNING with a dead
/// pid; the next tick's zombie sweep reclaims it as ZOMBIE and returns the
/// node to STALE, and a following tick launches a fresh attempt that
/// completes.
#[test]
fn zombie_worker_is_reclaimed_and_retried() {
    let stack = Stack::new();
    stack.slow_source("a", 30);

    let log_dir = stack.path().join("logs").join("manual");
    let mut child = stack.spawn_worker("a", &log_dir);

    assert!(wait_until(|| stack.node_state("a") == "REFRESHING"));

    child.kill().expect("kill worker");
    let _ = child.wait();

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "STALE"));

    // Swap in a fast refresher for the retry so the second tick's attempt
    // completes within the poll window.
    stack.source("a", &[], None);

    stack.tick().success();
    assert!(wait_until(|| stack.node_state("a") == "FRESH"));
}
