// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `do node` - single-node operations: set-stale, delete, refresh.

use crate::output::{report_error, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use do_core::{NodeId, SystemClock};
use do_engine::Orchestrator;

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Subcommand)]
pub enum NodeCommand {
    /// Mark a node (and its downstream closure) STALE
    SetStale {
        /// Node id
        id: String,
    },
    /// Remove a node's persisted row
    Delete {
        /// Node id
        id: String,
    },
    /// Force an immediate refresh and wait for it to finish
    Refresh {
        /// Node id
        id: String,
    },
}

pub fn handle(
    command: NodeCommand,
    orch: &mut Orchestrator<SystemClock>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        NodeCommand::SetStale { id } => {
            let nid = NodeId::new(id);
            orch.set_node_stale(&nid)
                .map_err(|e| report_error(e, format))?;
            match format {
                OutputFormat::Text => println!("{} and its downstream nodes are now STALE", nid),
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"id": nid.as_str(), "state": "STALE"}))
                }
            }
        }
        NodeCommand::Delete { id } => {
            let nid = NodeId::new(id);
            orch.delete_node(&nid).map_err(|e| report_error(e, format))?;
            match format {
                OutputFormat::Text => println!("Deleted {}", nid),
                OutputFormat::Json => println!("{}", serde_json::json!({"id": nid.as_str(), "deleted": true})),
            }
        }
        NodeCommand::Refresh { id } => {
            let nid = NodeId::new(id);
            let task = orch
                .refresh_node(&nid, std::process::id())
                .map_err(|e| report_error(e, format))?;
            let info = orch.info(&nid).map_err(|e| report_error(e, format))?;
            match format {
                OutputFormat::Text => {
                    println!(
                        "{} -> {} (task {} {})",
                        nid,
                        crate::color::status(&info.state.to_string()),
                        task.id,
                        crate::color::status(&task.state.to_string())
                    );
                    if let Some(error) = &task.info.error {
                        println!("  error: {error}");
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                        "node": nid.as_str(),
                        "state": info.state.to_string(),
                        "task": task,
                    }))?)
                }
            }
        }
    }
    Ok(())
}
