//! Shared black-box test harness: scaffolds a throwaway data stack
//! directory and runs the `data-orchestrator` binary against it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(20);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// A throwaway data stack directory a test can populate with sources,
/// models, and a store definition, then drive through `data-orchestrator`.
pub struct Stack {
    dir: tempfile::TempDir,
}

impl Stack {
    /// An empty stack with an in-memory store already configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("sources")).unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::create_dir_all(dir.path().join("stores")).unwrap();
        std::fs::write(dir.path().join("stores/store.toml"), "type = \"memory\"\n").unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Declare a source node with no upstream, an always-succeeding
    /// external refresher, and an optional `stale_after`.
    pub fn source(&self, id: &str, upstream: &[&str], stale_after: Option<&str>) {
        let mut toml = format!("id = \"{id}\"\n");
        if !upstream.is_empty() {
            toml.push_str(&format!(
                "upstream = [{}]\n",
                upstream.iter().map(|u| format!("\"{u}\"")).collect::<Vec<_>>().join(", ")
            ));
        }
        if let Some(s) = stale_after {
            toml.push_str(&format!("stale_after = \"{s}\"\n"));
        }
        toml.push_str("[refresher]\nkind = \"external\"\ncommand = [\"true\"]\n");
        std::fs::write(self.dir.path().join(format!("sources/{id}.toml")), toml).unwrap();
    }

    /// Declare a source whose refresher sleeps for `secs` before succeeding,
    /// long enough for a test to observe it RUNNING and kill it.
    pub fn slow_source(&self, id: &str, secs: u64) {
        let toml = format!(
            "id = \"{id}\"\n[refresher]\nkind = \"external\"\ncommand = [\"sleep\", \"{secs}\"]\n"
        );
        std::fs::write(self.dir.path().join(format!("sources/{id}.toml")), toml).unwrap();
    }

    /// Declare a source whose refresher always fails (exits non-zero).
    pub fn failing_source(&self, id: &str) {
        let toml = format!(
            "id = \"{id}\"\n[refresher]\nkind = \"external\"\ncommand = [\"false\"]\n"
        );
        std::fs::write(self.dir.path().join(format!("sources/{id}.toml")), toml).unwrap();
    }

    /// Declare a model node (`schema.table`) over an `upstream` list.
    pub fn model(&self, schema: &str, table: &str, upstream: &[&str]) {
        let toml = format!(
            "id = \"{table}\"\nschema_name = \"{schema}\"\ntable_name = \"{table}\"\nupstream = [{}]\n[refresher]\nkind = \"sql\"\nselect_sql = \"select 1\"\n",
            upstream.iter().map(|u| format!("\"{u}\"")).collect::<Vec<_>>().join(", ")
        );
        std::fs::create_dir_all(self.dir.path().join(format!("models/{schema}"))).unwrap();
        std::fs::write(self.dir.path().join(format!("models/{schema}/{table}.toml")), toml).unwrap();
    }

    pub fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("data-orchestrator").expect("binary built");
        cmd.arg("-C").arg(self.dir.path());
        cmd.args(args);
        cmd
    }

    pub fn tick(&self) -> assert_cmd::assert::Assert {
        self.cmd(&["tick"]).assert()
    }

    /// Launch `__refresh-worker` directly (not detached), so a test can hold
    /// onto the `std::process::Child` and kill it mid-refresh.
    pub fn spawn_worker(&self, nid: &str, log_dir: &Path) -> std::process::Child {
        std::fs::create_dir_all(log_dir).unwrap();
        Command::cargo_bin("data-orchestrator")
            .expect("binary built")
            .arg("__refresh-worker")
            .arg(self.dir.path())
            .arg(nid)
            .arg(log_dir)
            .spawn()
            .expect("spawn worker")
    }

    pub fn nodes_json(&self) -> serde_json::Value {
        let out = self.cmd(&["-o", "json", "nodes"]).output().expect("run");
        assert!(out.status.success(), "nodes failed: {}", String::from_utf8_lossy(&out.stderr));
        serde_json::from_slice(&out.stdout).expect("valid json")
    }

    pub fn node_state(&self, id: &str) -> String {
        let nodes = self.nodes_json();
        let arr = nodes.as_array().expect("array");
        arr.iter()
            .find(|n| n["id"] == id)
            .unwrap_or_else(|| panic!("node {id} not in {nodes}"))["state"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub fn pid_file_for(&self, log_dir: &Path, nid: &str) -> PathBuf {
        log_dir.join(format!("{}.pid", nid.replace('.', "__")))
    }

    /// The most recent `logs/<ts>-<uuid>` directory a tick created.
    pub fn latest_log_dir(&self) -> Option<PathBuf> {
        let logs = self.dir.path().join("logs");
        let mut entries: Vec<_> = std::fs::read_dir(&logs).ok()?.flatten().map(|e| e.path()).collect();
        entries.sort();
        entries.pop()
    }
}

/// Poll `condition` until it's true or the default timeout elapses.
pub fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < POLL_TIMEOUT {
        if condition() {
            return true;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    false
}
