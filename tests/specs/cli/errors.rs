use crate::prelude::Stack;

/// Operating on an unknown node id surfaces a `not_found` error with its
/// own exit code, and in `-o json` mode a structured `{code, details,
/// source}` payload on stdout rather than a prose message.
#[test]
fn unknown_node_is_not_found_in_text_mode() {
    let stack = Stack::new();
    stack.source("a", &[], None);

    stack
        .cmd(&["node", "set-stale", "nope"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicates::str::contains("not found"));
}

#[test]
fn unknown_node_is_not_found_in_json_mode() {
    let stack = Stack::new();
    stack.source("a", &[], None);

    let out = stack
        .cmd(&["-o", "json", "node", "delete", "nope"])
        .output()
        .expect("run");
    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stderr.is_empty(), "json mode should stay silent on stderr");

    let payload: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json body");
    assert_eq!(payload["code"], "not_found");
    assert!(payload["details"].as_str().unwrap().contains("nope"));
}

#[test]
fn malformed_definition_is_fatal_at_load_time() {
    let stack = Stack::new();
    std::fs::write(
        stack.path().join("sources/self_ref.toml"),
        "id = \"self_ref\"\nupstream = [\"self_ref\"]\n[refresher]\nkind = \"external\"\ncommand = [\"true\"]\n",
    )
    .unwrap();

    stack
        .cmd(&["nodes"])
        .assert()
        .failure()
        .code(7);
}
