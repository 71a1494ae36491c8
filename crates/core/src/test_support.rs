// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::task::TaskInfo;
use crate::{NodeId, TaskId};
use chrono::{TimeZone, Utc};

pub fn epoch(seconds: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

pub fn node_id(s: &str) -> NodeId {
    NodeId::new(s)
}

pub fn task_id(s: &str) -> TaskId {
    TaskId::new(s)
}

pub fn task_info(pid: u32) -> TaskInfo {
    TaskInfo {
        pid,
        stdout: format!("/tmp/{pid}.stdout"),
        stderr: format!("/tmp/{pid}.stderr"),
        error: None,
        traceback: None,
    }
}
