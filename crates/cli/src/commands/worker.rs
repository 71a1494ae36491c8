// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hidden subcommands the engine's scheduler forks instead of calling
//! directly: `__refresh-worker` runs a single node's refresher out of
//! process, `__sweep-zombies` reclaims RUNNING tasks whose process died.
//! Neither is meant to be typed by a human; both are excluded from `--help`.

use anyhow::{Context, Result};
use clap::Args;
use do_core::{NodeId, SystemClock, TaskInfo};
use do_engine::Orchestrator;
use do_storage::MigrationRegistry;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args)]
#[command(hide = true)]
pub struct RefreshWorkerArgs {
    pub data_stack_dir: PathBuf,
    pub node_id: String,
    pub log_dir: PathBuf,
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
#[command(hide = true)]
pub struct SweepZombiesArgs {
    pub data_stack_dir: PathBuf,
}

/// Run one node's refresher to completion, logging to `<log_dir>/<nid>.{pid,stdout,stderr}`.
///
/// Always exits 0: a refresher failure is captured into the task row by
/// `execute_refresh`, not surfaced as a process exit code, per spec.md's
/// worker failure semantics.
pub fn handle_refresh(args: RefreshWorkerArgs) -> Result<()> {
    let nid = NodeId::new(args.node_id);
    let pid = std::process::id();
    let (pid_path, stdout_path, stderr_path) = do_engine::log_paths(&args.log_dir, &nid);

    std::fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("creating {}", args.log_dir.display()))?;
    std::fs::write(&pid_path, pid.to_string())
        .with_context(|| format!("writing {}", pid_path.display()))?;

    let mut stdout = do_engine::LinePrefixWriter::create(&stdout_path, pid)
        .with_context(|| format!("creating {}", stdout_path.display()))?;
    let mut stderr = do_engine::LinePrefixWriter::create(&stderr_path, pid)
        .with_context(|| format!("creating {}", stderr_path.display()))?;

    let exe = std::env::current_exe().context("resolving current executable")?;
    let backend = crate::backend::open(&args.data_stack_dir)?;
    let mut orch = Orchestrator::open(
        args.data_stack_dir,
        exe,
        backend,
        SystemClock,
        MigrationRegistry::new(),
    )
    .context("opening data stack")?;

    let info = TaskInfo {
        pid,
        stdout: stdout_path.display().to_string(),
        stderr: stderr_path.display().to_string(),
        error: None,
        traceback: None,
    };

    let _ = writeln!(stdout, "starting refresh of {nid}");

    match orch.run_worker_refresh(&nid, info, args.force) {
        Ok(Some(task)) => {
            let _ = writeln!(stdout, "{nid} finished as {}", task.state);
        }
        Ok(None) => {
            let _ = writeln!(stdout, "{nid} was no longer stale, skipping");
        }
        Err(err) => {
            let _ = writeln!(stderr, "{nid} refresh failed before starting: {err}");
        }
    }

    // Per spec.md §4.5 step 6: unlink the pid file once the attempt is
    // settled, regardless of outcome.
    let _ = std::fs::remove_file(&pid_path);

    Ok(())
}

/// Reclaim RUNNING tasks whose pid is no longer alive.
pub fn handle_sweep(args: SweepZombiesArgs) -> Result<()> {
    let exe = std::env::current_exe().context("resolving current executable")?;
    let backend = crate::backend::open(&args.data_stack_dir)?;
    let mut orch = Orchestrator::open(
        args.data_stack_dir,
        exe,
        backend,
        SystemClock,
        MigrationRegistry::new(),
    )
    .context("opening data stack")?;

    orch.sweep_zombies(do_engine::process_exists)
        .context("sweeping zombie tasks")?;
    Ok(())
}
