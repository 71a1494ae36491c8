use crate::prelude::{wait_until, Stack};

/// Two independent STALE nodes with no upstream both launch on the same
/// tick and each reach DONE with exactly one task.
#[test]
fn sibling_nodes_refresh_concurrently() {
    let stack = Stack::new();
    stack.source("x", &[], None);
    stack.source("y", &[], None);

    let report = stack.cmd(&["-o", "json", "tick"]).output().expect("run");
    assert!(report.status.success());
    let report: serde_json::Value = serde_json::from_slice(&report.stdout).unwrap();
    let refreshed: Vec<String> = report["refreshed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(refreshed.contains(&"x".to_string()));
    assert!(refreshed.contains(&"y".to_string()));

    assert!(wait_until(|| stack.node_state("x") == "FRESH"));
    assert!(wait_until(|| stack.node_state("y") == "FRESH"));

    let nodes = stack.nodes_json();
    for id in ["x", "y"] {
        let node = nodes.as_array().unwrap().iter().find(|n| n["id"] == id).unwrap();
        assert_eq!(node["last_task"]["state"], "DONE");
    }
}
