// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task (refresh attempt) state machine.

use crate::id::{NodeId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Running,
    Done,
    Errored,
    Zombie,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Running => "RUNNING",
            TaskState::Done => "DONE",
            TaskState::Errored => "ERRORED",
            TaskState::Zombie => "ZOMBIE",
        };
        write!(f, "{s}")
    }
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

/// Per-task metadata: pid, log paths, and (on failure) error/traceback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInfo {
    pub pid: u32,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

/// Persisted record for one refresh attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub nid: NodeId,
    pub state: TaskState,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub info: TaskInfo,
}

impl Task {
    pub fn running(id: TaskId, nid: NodeId, started_at: DateTime<Utc>, info: TaskInfo) -> Self {
        Self {
            id,
            nid,
            state: TaskState::Running,
            started_at,
            completed_at: None,
            info,
        }
    }
}
