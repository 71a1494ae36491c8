// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `do nodes` - full `info()` dump (nodes + their newest task), text table or JSON.

use crate::output::{report_error, OutputFormat};
use crate::table::{Column, Table};
use anyhow::Result;
use do_core::SystemClock;
use do_engine::Orchestrator;

pub fn handle(orch: &mut Orchestrator<SystemClock>, format: OutputFormat) -> Result<()> {
    let ids: Vec<_> = orch.nodes().map(|n| n.id.clone()).collect();

    let mut infos = Vec::with_capacity(ids.len());
    for id in &ids {
        infos.push(orch.info(id).map_err(|e| report_error(e, format))?);
    }

    match format {
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::muted("ID"),
                Column::status("STATE"),
                Column::left("UPSTREAM"),
                Column::left("LAST TASK"),
            ]);
            for info in &infos {
                let upstream = if info.upstream.is_empty() {
                    "-".to_string()
                } else {
                    info.upstream
                        .iter()
                        .map(|u| u.as_str().to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                };
                let last_task = info
                    .last_task
                    .as_ref()
                    .map(|t| format!("{} ({})", t.id, t.state))
                    .unwrap_or_else(|| "-".to_string());
                table.row(vec![
                    info.id.as_str().to_string(),
                    info.state.to_string(),
                    upstream,
                    last_task,
                ]);
            }
            table.render(&mut std::io::stdout());
        }
        OutputFormat::Json => {
            let payload: Vec<_> = infos
                .iter()
                .map(|info| {
                    serde_json::json!({
                        "id": info.id.as_str(),
                        "state": info.state.to_string(),
                        "container": info.container,
                        "upstream": info.upstream.iter().map(|u| u.as_str()).collect::<Vec<_>>(),
                        "stale_after": info.stale_after.map(|s| s.to_string()),
                        "current_tid": info.current_tid.as_ref().map(|t| t.as_str()),
                        "last_task": info.last_task,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}
