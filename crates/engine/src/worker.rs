// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The refresh worker (spec.md §4.5): starts a task, invokes the node's
//! refresher against the external store, and completes or fails the task.
//!
//! `execute_refresh` is shared by both callers that run it: the detached
//! `__refresh-worker` subcommand the scheduler forks for a normal tick, and
//! the inline, synchronous path `refresh_node` uses for a forced refresh in
//! the caller's own process.

use crate::catalog::RefresherBinding;
use crate::error::EngineError;
use crate::task_manager::TaskManager;
use chrono::Utc;
use do_core::{Clock, NodeId, Task, TaskInfo};
use do_definitions::RefresherKind;
use do_storage::StateStore;
use do_stores::{Row, Store};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Start (or force-start) a task, run the refresher, and complete/fail it.
///
/// Returns `Ok(None)` when `force` is false and the node wasn't STALE — the
/// worker's "log and exit 0" precondition miss, not an error.
pub fn execute_refresh<C: Clock>(
    store: &mut StateStore,
    task_manager: &TaskManager<C>,
    binding: &RefresherBinding,
    backend: &dyn Store,
    nid: &NodeId,
    info: TaskInfo,
    force: bool,
) -> Result<Option<Task>, EngineError> {
    let tid = if force {
        task_manager.force_start_task(store, nid, info)?
    } else {
        match task_manager.start_task(store, nid, info) {
            Ok(tid) => tid,
            Err(EngineError::NotStale(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
    };

    match run_refresher(binding, backend) {
        Ok(()) => task_manager.complete_task(store, nid, &tid)?,
        Err((error, traceback)) => task_manager.fail_task(store, nid, &tid, error, traceback)?,
    }

    Ok(task_manager.last_task_for_node(store, nid)?)
}

fn run_refresher(binding: &RefresherBinding, backend: &dyn Store) -> Result<(), (String, Option<String>)> {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run_refresher_inner(binding, backend)
    }));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(msg)) => Err((msg, None)),
        Err(panic) => Err((panic_message(&panic), Some("refresher panicked".to_string()))),
    }
}

fn run_refresher_inner(binding: &RefresherBinding, backend: &dyn Store) -> Result<(), String> {
    match &binding.kind {
        RefresherKind::Sql { select_sql } => backend
            .create_or_replace_model(&binding.schema, &binding.table, select_sql)
            .map_err(|e| e.to_string()),
        RefresherKind::External { command } => run_external(command, &binding.schema, &binding.table, backend),
    }
}

fn run_external(command: &[String], schema: &str, table: &str, backend: &dyn Store) -> Result<(), String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| "external refresher has an empty command".to_string())?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run external command {program}: {e}"))?;

    if !output.status.success() {
        return Err(format!(
            "external command {program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let records = parse_records(&output.stdout)?;
    backend
        .load_raw_from_records(schema, table, records)
        .map_err(|e| e.to_string())
}

/// The external command's stdout is newline-delimited JSON objects, one
/// per record.
fn parse_records(stdout: &[u8]) -> Result<Vec<Row>, String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let value: serde_json::Value =
                serde_json::from_str(line).map_err(|e| format!("malformed record JSON: {e}"))?;
            value
                .as_object()
                .cloned()
                .ok_or_else(|| "record line is not a JSON object".to_string())
        })
        .collect()
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "refresher panicked with a non-string payload".to_string()
    }
}

/// The three per-task log paths a tick-spawned worker writes to, rooted at
/// `<log_dir>/<node-id-with-slashes-for-dots>`.
pub fn log_paths(log_dir: &Path, nid: &NodeId) -> (PathBuf, PathBuf, PathBuf) {
    let stem = nid.as_str().replace('.', "__");
    (
        log_dir.join(format!("{stem}.pid")),
        log_dir.join(format!("{stem}.stdout")),
        log_dir.join(format!("{stem}.stderr")),
    )
}

/// Wraps a log file and prefixes every line the worker writes to it with
/// `<pid> HH:MM:SS `, flushing per line so a `tail -f` sees output promptly.
pub struct LinePrefixWriter {
    file: std::fs::File,
    pid: u32,
    at_line_start: bool,
}

impl LinePrefixWriter {
    pub fn create(path: &Path, pid: u32) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            file,
            pid,
            at_line_start: true,
        })
    }
}

impl Write for LinePrefixWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut written = 0;
        for chunk in buf.split_inclusive(|b| *b == b'\n') {
            if self.at_line_start {
                let prefix = format!("{} {} ", self.pid, Utc::now().format("%H:%M:%S"));
                self.file.write_all(prefix.as_bytes())?;
            }
            self.file.write_all(chunk)?;
            self.at_line_start = chunk.ends_with(b"\n");
            written += chunk.len();
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

/// Spawn a detached `__refresh-worker` subcommand for `nid`, double-fork
/// style: a new process group so it survives the orchestrator process
/// exiting, stdio redirected to `/dev/null` (the worker reopens its own log
/// files once it's running, via [`LinePrefixWriter`]).
pub fn spawn_refresh_worker(
    exe: &Path,
    data_stack_dir: &Path,
    nid: &NodeId,
    log_dir: &Path,
    force: bool,
) -> std::io::Result<u32> {
    let mut cmd = Command::new(exe);
    cmd.arg("__refresh-worker")
        .arg(data_stack_dir)
        .arg(nid.as_str())
        .arg(log_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if force {
        cmd.arg("--force");
    }
    detach(&mut cmd);
    Ok(cmd.spawn()?.id())
}

/// Spawn a detached `__sweep-zombies` subcommand.
pub fn spawn_zombie_sweeper(exe: &Path, data_stack_dir: &Path) -> std::io::Result<u32> {
    let mut cmd = Command::new(exe);
    cmd.arg("__sweep-zombies")
        .arg(data_stack_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut cmd);
    Ok(cmd.spawn()?.id())
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn detach(_cmd: &mut Command) {}

/// Check whether a pid is still alive by shelling out to `kill -0`, matching
/// the convention used elsewhere in this codebase for process liveness
/// checks without a direct signal-sending dependency.
pub fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
