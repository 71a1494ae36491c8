// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `do tick` - run one scheduling pass, or loop until interrupted.

use crate::output::{report_error, OutputFormat};
use anyhow::Result;
use clap::Args;
use do_core::SystemClock;
use do_engine::Orchestrator;
use std::time::Duration;

#[derive(Args)]
pub struct TickArgs {
    /// Keep ticking on an interval (DO_TICK_INTERVAL, default 30s) until
    /// SIGINT/SIGTERM
    #[arg(long)]
    pub r#loop: bool,
}

pub async fn handle(args: TickArgs, orch: &mut Orchestrator<SystemClock>, format: OutputFormat) -> Result<()> {
    if !args.r#loop {
        return run_one(orch, format);
    }
    run_loop(orch, format).await
}

fn run_one(orch: &mut Orchestrator<SystemClock>, format: OutputFormat) -> Result<()> {
    let report = orch.tick().map_err(|e| report_error(e, format))?;
    match format {
        OutputFormat::Text => {
            println!("tick: {} refreshed, {} staled, zombie sweep {}", report.refreshed.len(), report.staled.len(), if report.swept { "launched" } else { "skipped" });
            for id in &report.refreshed {
                println!("  refreshing {id}");
            }
            for id in &report.staled {
                println!("  expired {id}");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "log_dir": report.log_dir,
                    "refreshed": report.refreshed.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
                    "staled": report.staled.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
                    "swept": report.swept,
                })
            );
        }
    }
    Ok(())
}

async fn run_loop(orch: &mut Orchestrator<SystemClock>, format: OutputFormat) -> Result<()> {
    let interval = do_core::config::tick_interval();
    loop {
        run_one(orch, format)?;
        if wait_or_shutdown(interval).await {
            return Ok(());
        }
    }
}

/// Sleeps for `interval`, returning `true` if a shutdown signal arrived
/// first.
async fn wait_or_shutdown(interval: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => false,
        _ = shutdown_signal() => true,
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => std::future::pending().await,
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
