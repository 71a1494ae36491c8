// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output format selection shared by every command.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print an error's structured `{code, details, source}` payload to stdout
/// and return the exit-code-carrying error `main` reports on the way out.
///
/// Text mode skips the JSON body and lets the message flow through the
/// normal `anyhow` chain instead, matching spec.md §7's "payload on -o json"
/// contract.
pub fn report_error(err: do_engine::EngineError, format: OutputFormat) -> anyhow::Error {
    let code = exit_code_for(err.code());
    if format == OutputFormat::Json {
        let payload = do_core::ErrorPayload::from(&err);
        if let Ok(body) = serde_json::to_string_pretty(&payload) {
            println!("{body}");
        }
        crate::exit_error::ExitError::new(code, String::new()).into()
    } else {
        crate::exit_error::ExitError::new(code, err.to_string()).into()
    }
}

fn exit_code_for(code: &str) -> i32 {
    match code {
        "not_found" => 3,
        "invalid_state" => 4,
        "store_busy" => 5,
        "refresher_failure" => 6,
        "malformed_definition" => 7,
        _ => 1,
    }
}
