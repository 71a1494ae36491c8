// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use do_definitions::RefresherKind;

fn source(id: &str, upstream: &[&str]) -> SourceDef {
    SourceDef {
        id: id.to_string(),
        upstream: upstream.iter().map(|s| s.to_string()).collect(),
        details: serde_json::Value::Null,
        stale_after: None,
        refresher: RefresherKind::External {
            command: vec!["true".to_string()],
        },
    }
}

fn model(id: &str, schema: &str, table: &str, upstream: &[&str]) -> ModelDef {
    ModelDef {
        id: id.to_string(),
        schema_name: schema.to_string(),
        table_name: table.to_string(),
        upstream: upstream.iter().map(|s| s.to_string()).collect(),
        details: serde_json::Value::Null,
        stale_after: Some("6h".to_string()),
        refresher: RefresherKind::Sql {
            select_sql: "select 1".to_string(),
        },
    }
}

#[test]
fn builds_node_ids_from_source_and_model_conventions() {
    let catalog = build_catalog(
        &[source("raw_orders", &[])],
        &[model("orders", "analytics", "orders", &["raw_orders"])],
    )
    .unwrap();

    let ids: Vec<&str> = catalog.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(ids.contains(&"raw_orders"));
    assert!(ids.contains(&"analytics.orders"));
}

#[test]
fn model_stale_after_is_parsed() {
    let catalog = build_catalog(&[], &[model("orders", "analytics", "orders", &[])]).unwrap();
    let node = catalog
        .nodes
        .iter()
        .find(|n| n.id.as_str() == "analytics.orders")
        .unwrap();
    assert!(node.stale_after.is_some());
}

#[test]
fn self_upstream_is_a_catalog_error() {
    let err = build_catalog(&[source("a", &["a"])], &[]).unwrap_err();
    assert!(matches!(err, CatalogError::SelfUpstream(_)));
}

#[test]
fn refresher_bindings_carry_schema_and_table() {
    let catalog = build_catalog(&[source("raw_orders", &[])], &[]).unwrap();
    let binding = catalog
        .refreshers
        .get(&do_core::NodeId::new("raw_orders"))
        .unwrap();
    assert_eq!(binding.schema, "raw");
    assert_eq!(binding.table, "raw_orders");
}
