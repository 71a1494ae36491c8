// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-level operations on a data stack's definition tree
//! (`sources/`, `models/`, `stores/`).

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path} does not exist")]
    NotFound { path: String },
    #[error("{path} already exists")]
    AlreadyExists { path: String },
    #[error("{path} is neither under models/ nor sources/")]
    NotADefinition { path: String },
}

/// Write `source` to `<data_stack_dir>/<relative_path>`, creating parent
/// directories as needed.
pub fn update_file(
    data_stack_dir: &Path,
    relative_path: &Path,
    source: &str,
) -> Result<PathBuf, WorkspaceError> {
    let path = data_stack_dir.join(relative_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, source)?;
    Ok(path)
}

/// Delete `<data_stack_dir>/<relative_path>` if it exists.
pub fn delete_file(
    data_stack_dir: &Path,
    relative_path: &Path,
) -> Result<PathBuf, WorkspaceError> {
    let path = data_stack_dir.join(relative_path);
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(path)
}

/// Rename `<data_stack_dir>/<src>` to `<data_stack_dir>/<dst>`.
pub fn move_file(
    data_stack_dir: &Path,
    src: &Path,
    dst: &Path,
) -> Result<(), WorkspaceError> {
    let src_path = data_stack_dir.join(src);
    let dst_path = data_stack_dir.join(dst);
    if !src_path.exists() {
        return Err(WorkspaceError::NotFound {
            path: src_path.display().to_string(),
        });
    }
    if dst_path.exists() {
        return Err(WorkspaceError::AlreadyExists {
            path: dst_path.display().to_string(),
        });
    }
    std::fs::rename(&src_path, &dst_path)?;
    Ok(())
}

/// Derive the node ids owned by a definition file: the basename of a
/// `models/<id>.toml` or `sources/<id>.toml` path, used by callers that
/// then cascade `set_node_stale` on each.
pub fn definition_id_for_file(relative_path: &Path) -> Result<String, WorkspaceError> {
    let dir = relative_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let stem = relative_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    match dir {
        "models" | "sources" => Ok(stem.to_string()),
        _ => Err(WorkspaceError::NotADefinition {
            path: relative_path.display().to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
