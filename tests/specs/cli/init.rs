use assert_cmd::Command;

/// `do init <dir>` scaffolds the three definition directories and a default
/// in-memory store, and is idempotent against a directory that already has
/// a store configured.
#[test]
fn init_scaffolds_an_empty_data_stack() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("data-orchestrator")
        .unwrap()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("sources").is_dir());
    assert!(dir.path().join("models").is_dir());
    assert!(dir.path().join("stores/store.toml").is_file());

    // A stack with nothing defined in it reports zero nodes without error.
    Command::cargo_bin("data-orchestrator")
        .unwrap()
        .arg("-C")
        .arg(dir.path())
        .args(["-o", "json", "nodes"])
        .assert()
        .success()
        .stdout(predicates::str::contains("[]"));
}

#[test]
fn init_does_not_clobber_an_existing_store_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("stores")).unwrap();
    std::fs::write(
        dir.path().join("stores/store.toml"),
        "type = \"postgres\"\ndsn = \"postgres://example\"\n",
    )
    .unwrap();

    Command::cargo_bin("data-orchestrator")
        .unwrap()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();

    let contents = std::fs::read_to_string(dir.path().join("stores/store.toml")).unwrap();
    assert!(contents.contains("postgres"));
}
