// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `do init` - scaffold a new data stack directory: empty `sources/`,
//! `models/` trees plus a default in-memory `stores/store.toml`, ported from
//! the original `DataStack::create_default_store` convention.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to scaffold (created if missing)
    pub dir: PathBuf,
}

pub fn handle(args: InitArgs) -> Result<()> {
    let dir = args.dir;
    std::fs::create_dir_all(dir.join("sources"))
        .with_context(|| format!("creating {}/sources", dir.display()))?;
    std::fs::create_dir_all(dir.join("models"))
        .with_context(|| format!("creating {}/models", dir.display()))?;
    std::fs::create_dir_all(dir.join("stores"))
        .with_context(|| format!("creating {}/stores", dir.display()))?;

    let store_toml = dir.join("stores/store.toml");
    if !store_toml.exists() {
        std::fs::write(&store_toml, "type = \"memory\"\n")
            .with_context(|| format!("writing {}", store_toml.display()))?;
    }

    println!("Initialized data stack at {}", dir.display());
    Ok(())
}
