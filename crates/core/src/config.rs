// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-stack configuration: `orchestrator.toml` plus environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn parse_duration_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Resolve the data-stack directory: `DO_STATE_DIR` env var, else the
/// directory passed on the command line, else the current directory.
pub fn state_dir(cli_arg: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var("DO_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = cli_arg {
        return dir.to_path_buf();
    }
    PathBuf::from(".")
}

/// `RUST_LOG`-style filter override for the orchestrator's own logging.
pub fn log_filter() -> Option<String> {
    std::env::var("DO_LOG").ok().filter(|s| !s.is_empty())
}

/// Interval between ticks in `tick --loop` mode. Defaults to 30s.
pub fn tick_interval() -> Duration {
    parse_duration_secs("DO_TICK_INTERVAL").unwrap_or(Duration::from_secs(30))
}

/// On-disk settings for a data stack, stored at `<state_dir>/orchestrator.toml`.
///
/// This is intentionally small: most tunables are environment overrides
/// (see above) so that a worker re-exec doesn't need to re-parse the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default `stale_after` applied to nodes that don't set their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_stale_after: Option<String>,
    /// Maximum store-lock retry attempts before surfacing `StoreBusy`.
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,
}

fn default_lock_retries() -> u32 {
    5
}

impl Config {
    pub fn load(state_dir: &Path) -> Result<Self, ConfigError> {
        let path = state_dir.join("orchestrator.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, state_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join("orchestrator.toml");
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed orchestrator.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize orchestrator.toml: {0}")]
    Serialize(#[from] toml::ser::Error),
}
