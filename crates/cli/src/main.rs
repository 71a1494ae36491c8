// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `data-orchestrator` - drives a data stack directory through the node
//! registry, task lifecycle, and scheduler in `do-engine`.

mod backend;
mod color;
mod commands;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{init, node, nodes, tick, worker};
use do_core::SystemClock;
use do_engine::Orchestrator;
use do_storage::MigrationRegistry;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "do",
    version,
    about = "Keep a DAG of derived data fresh against its sources"
)]
struct Cli {
    /// Data stack directory (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scheduling pass (or loop on an interval)
    Tick(tick::TickArgs),
    /// Single-node operations: set-stale, delete, refresh
    Node(node::NodeArgs),
    /// List every node and its resolved state
    Nodes,
    /// Scaffold a new data stack directory
    Init(init::InitArgs),
    #[command(hide = true, name = "__refresh-worker")]
    RefreshWorker(worker::RefreshWorkerArgs),
    #[command(hide = true, name = "__sweep-zombies")]
    SweepZombies(worker::SweepZombiesArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e.downcast_ref::<exit_error::ExitError>().map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {msg}");
        }
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    if let Ok(filter) = std::env::var("RUST_LOG").or_else(|_| {
        do_core::config::log_filter().ok_or(std::env::VarError::NotPresent)
    }) {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    let cli = Cli::parse();
    let format = cli.output;
    let directory = cli.directory;

    // `__refresh-worker`/`__sweep-zombies` carry their own data stack
    // directory positionally and ignore `-C`, matching how the scheduler
    // invokes them. `init` scaffolds a directory that may not exist yet, so
    // it also runs before a data stack is opened.
    match cli.command {
        Commands::RefreshWorker(args) => return worker::handle_refresh(args),
        Commands::SweepZombies(args) => return worker::handle_sweep(args),
        Commands::Init(args) => return init::handle(args),
        Commands::Tick(args) => {
            let mut orch = open_orchestrator(directory, format)?;
            tick::handle(args, &mut orch, format).await
        }
        Commands::Node(args) => {
            let mut orch = open_orchestrator(directory, format)?;
            node::handle(args.command, &mut orch, format)
        }
        Commands::Nodes => {
            let mut orch = open_orchestrator(directory, format)?;
            nodes::handle(&mut orch, format)
        }
    }
}

fn open_orchestrator(
    directory: Option<PathBuf>,
    format: OutputFormat,
) -> Result<Orchestrator<SystemClock>> {
    let resolved = do_core::config::state_dir(directory.as_deref());
    let data_stack_dir = std::fs::canonicalize(&resolved)
        .map_err(|e| anyhow::anyhow!("cannot use directory '{}': {}", resolved.display(), e))?;
    let exe = std::env::current_exe().map_err(|e| anyhow::anyhow!("resolving current executable: {e}"))?;
    let store_backend = backend::open(&data_stack_dir)?;
    Orchestrator::open(data_stack_dir, exe, store_backend, SystemClock, MigrationRegistry::new())
        .map_err(|e| output::report_error(e, format))
}

/// Format an anyhow error, deduplicating the chain when the top-level
/// message already contains every cause's text.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err.chain().skip(1).all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }
    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {i}: {cause}"));
    }
    buf
}
