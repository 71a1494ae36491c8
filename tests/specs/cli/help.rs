use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn top_level_help_lists_the_public_subcommands() {
    Command::cargo_bin("data-orchestrator")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("tick"))
        .stdout(predicates::str::contains("node"))
        .stdout(predicates::str::contains("nodes"))
        .stdout(predicates::str::contains("init"))
        // Hidden worker subcommands never show up in --help output.
        .stdout(predicates::str::contains("__refresh-worker").not())
        .stdout(predicates::str::contains("__sweep-zombies").not());
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    Command::cargo_bin("data-orchestrator")
        .unwrap()
        .assert()
        .failure();
}
