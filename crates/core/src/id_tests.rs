// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn node_id_display_and_eq() {
    let id = NodeId::new("analytics.orders");
    assert_eq!(id.to_string(), "analytics.orders");
    assert_eq!(id, "analytics.orders");
    assert_eq!(id.as_str(), "analytics.orders");
}

#[test]
fn short_truncates() {
    let id = NodeId::new("analytics.orders");
    assert_eq!(id.short(4), "anal");
    assert_eq!(id.short(100), "analytics.orders");
}

#[test]
fn task_id_for_attempt_is_stable() {
    let ts = chrono::Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap();
    let a = TaskId::for_attempt(ts, 4242);
    let b = TaskId::for_attempt(ts, 4242);
    assert_eq!(a, b);
    assert!(a.as_str().ends_with("-4242"));
}
