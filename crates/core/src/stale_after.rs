// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Freshness TTL parsing (`"6h"`, `"300s"`, ...).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed `stale_after` duration, stored alongside the node definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StaleAfter(i64);

impl StaleAfter {
    pub fn as_duration(self) -> Duration {
        Duration::seconds(self.0)
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        parse_duration(s).map(|d| StaleAfter(d.num_seconds()))
    }
}

impl fmt::Display for StaleAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl TryFrom<String> for StaleAfter {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<StaleAfter> for String {
    fn from(s: StaleAfter) -> String {
        s.to_string()
    }
}

/// Parse a duration string like `"6h"`, `"24h"`, `"300s"`, `"90m"`.
///
/// Accepts a bare integer (seconds), or an integer followed by a unit
/// suffix: `s`/`sec`/`secs`/`second`/`seconds`, `m`/`min`/`mins`/`minute`/
/// `minutes`, `h`/`hr`/`hrs`/`hour`/`hours`, `d`/`day`/`days`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: i64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {s}"))?;

    let multiplier = match suffix.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {other}")),
    };

    Ok(Duration::seconds(num * multiplier))
}

#[cfg(test)]
#[path = "stale_after_tests.rs"]
mod tests;
