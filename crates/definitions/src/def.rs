// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source, model, and store definitions parsed from a data stack's
//! `sources/`, `models/`, and `stores/` directories.

use crate::RefresherKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("TOML parse error in {path}: {inner}")]
    Toml { path: String, inner: toml::de::Error },
    #[error("IO error reading {path}: {inner}")]
    Io { path: String, inner: std::io::Error },
}

/// A single node's static definition, as loaded from a `.toml` file under
/// `sources/` or `models/`.
///
/// `container` is derived as `<kind>:<id>` at load time (see
/// `SourceDef::container`/`ModelDef::container`), mirroring the original
/// `fqid()` convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDef {
    pub id: String,
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_after: Option<String>,
    pub refresher: RefresherKind,
}

impl SourceDef {
    pub fn container(&self) -> String {
        format!("source:{}", self.id)
    }

    pub fn parse_toml(path: &std::path::Path) -> Result<Self, ParseError> {
        parse_toml_file(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDef {
    pub id: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_after: Option<String>,
    pub refresher: RefresherKind,
}

impl ModelDef {
    pub fn container(&self) -> String {
        format!("model:{}", self.id)
    }

    /// The data node id this model produces: `<schema>.<table>`.
    pub fn node_id(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn parse_toml(path: &std::path::Path) -> Result<Self, ParseError> {
        parse_toml_file(path)
    }
}

/// A store backend definition, as loaded from `stores/store.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreDef {
    Postgres { dsn: String },
    Memory,
}

impl Default for StoreDef {
    fn default() -> Self {
        StoreDef::Memory
    }
}

fn parse_toml_file<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, ParseError> {
    let raw = std::fs::read_to_string(path).map_err(|inner| ParseError::Io {
        path: path.display().to_string(),
        inner,
    })?;
    toml::from_str(&raw).map_err(|inner| ParseError::Toml {
        path: path.display().to_string(),
        inner,
    })
}

/// Load every `*.toml` source definition under `<data_stack_dir>/sources/`.
pub fn load_sources(data_stack_dir: &std::path::Path) -> Result<Vec<SourceDef>, ParseError> {
    load_toml_dir(&data_stack_dir.join("sources"))
}

/// Load every `*.toml` model definition under `<data_stack_dir>/models/`
/// (recursively, to allow schema-named subdirectories).
pub fn load_models(data_stack_dir: &std::path::Path) -> Result<Vec<ModelDef>, ParseError> {
    load_toml_dir(&data_stack_dir.join("models"))
}

fn load_toml_dir<T: serde::de::DeserializeOwned>(
    dir: &std::path::Path,
) -> Result<Vec<T>, ParseError> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    let mut paths: Vec<_> = walk_toml_files(dir);
    paths.sort();
    for path in paths {
        out.push(parse_toml_file(&path)?);
    }
    Ok(out)
}

fn walk_toml_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_toml_files(&path));
        } else if path.extension().is_some_and(|e| e == "toml") {
            out.push(path);
        }
    }
    out
}

/// Load the single store definition under `<data_stack_dir>/stores/`.
pub fn load_store(data_stack_dir: &std::path::Path) -> Result<StoreDef, ParseError> {
    let dir = data_stack_dir.join("stores");
    let path = dir.join("store.toml");
    if !path.exists() {
        return Ok(StoreDef::default());
    }
    parse_toml_file(&path)
}

/// Validate that no upstream id is listed twice and that no node lists
/// itself as upstream (invariant I1).
pub fn validate_no_self_upstream(id: &str, upstream: &[String]) -> Result<(), String> {
    if upstream.iter().any(|u| u == id) {
        return Err(format!("node {id} lists itself as upstream"));
    }
    Ok(())
}

/// Deduplicate upstream ids while preserving declared order (edge case E3).
pub fn dedup_upstream(upstream: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    upstream
        .iter()
        .filter(|u| seen.insert((*u).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "def_tests.rs"]
mod tests;
