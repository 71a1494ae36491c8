// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Converts static source/model definitions (`do-definitions`) into the
//! core node graph plus a side table of refresher bindings, the piece
//! spec.md leaves as "a refresher callable supplied by the producing
//! source/model" (spec.md §3, §6).

use do_core::{Node, NodeId, StaleAfter};
use do_definitions::{ModelDef, RefresherKind, SourceDef};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    SelfUpstream(String),
    #[error("invalid stale_after on {id}: {reason}")]
    StaleAfter { id: String, reason: String },
}

/// Where a refresher writes its output, and what it does to produce it.
#[derive(Debug, Clone)]
pub struct RefresherBinding {
    pub schema: String,
    pub table: String,
    pub kind: RefresherKind,
}

/// The fully resolved catalog: every node plus its refresher binding.
/// Orphans have no entry in `refreshers` (spec.md: "cannot be refreshed").
#[derive(Debug, Default)]
pub struct Catalog {
    pub nodes: Vec<Node>,
    pub refreshers: HashMap<NodeId, RefresherBinding>,
}

fn stale_after_of(id: &str, raw: &Option<String>) -> Result<Option<StaleAfter>, CatalogError> {
    raw.as_deref()
        .map(|s| {
            StaleAfter::parse(s).map_err(|reason| CatalogError::StaleAfter {
                id: id.to_string(),
                reason,
            })
        })
        .transpose()
}

/// Build a [`Catalog`] from every source and model definition in a data
/// stack. Upstream ids are deduplicated (E3) and validated against
/// self-reference (I1); dangling upstream ids are left unresolved here —
/// that's the registry's `backpatch_upstream` job (spec.md §4.2).
pub fn build_catalog(sources: &[SourceDef], models: &[ModelDef]) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::default();

    for source in sources {
        let upstream = do_definitions::dedup_upstream(&source.upstream);
        do_definitions::validate_no_self_upstream(&source.id, &upstream)
            .map_err(CatalogError::SelfUpstream)?;

        let id = NodeId::new(source.id.clone());
        catalog.nodes.push(Node {
            id: id.clone(),
            container: source.container(),
            upstream: upstream.iter().map(NodeId::new).collect(),
            details: source.details.clone(),
            stale_after: stale_after_of(&source.id, &source.stale_after)?,
            is_orphan: false,
        });
        catalog.refreshers.insert(
            id,
            RefresherBinding {
                schema: "raw".to_string(),
                table: source.id.clone(),
                kind: source.refresher.clone(),
            },
        );
    }

    for model in models {
        let upstream = do_definitions::dedup_upstream(&model.upstream);
        do_definitions::validate_no_self_upstream(&model.node_id(), &upstream)
            .map_err(CatalogError::SelfUpstream)?;

        let id = NodeId::new(model.node_id());
        catalog.nodes.push(Node {
            id: id.clone(),
            container: model.container(),
            upstream: upstream.iter().map(NodeId::new).collect(),
            details: model.details.clone(),
            stale_after: stale_after_of(&model.node_id(), &model.stale_after)?,
            is_orphan: false,
        });
        catalog.refreshers.insert(
            id,
            RefresherBinding {
                schema: model.schema_name.clone(),
                table: model.table_name.clone(),
                kind: model.refresher.clone(),
            },
        );
    }

    Ok(catalog)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
