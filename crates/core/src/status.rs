// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status enums shared by the state tree.
//!
//! All of these serialize as lower-case strings. Agent status and drive mode
//! accept historical aliases on read; unknown values coerce to the safe
//! default instead of failing the load, because the state tree is
//! operator-repairable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Derived (or self-declared) worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentStatus {
    #[default]
    Working,
    Draining,
    Idle,
}

impl AgentStatus {
    /// Parse a stored status, accepting aliases (`busy`, `drain`, `standby`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "work" | "working" | "busy" => Some(AgentStatus::Working),
            "drain" | "draining" => Some(AgentStatus::Draining),
            "idle" | "standby" => Some(AgentStatus::Idle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Working => "working",
            AgentStatus::Draining => "draining",
            AgentStatus::Idle => "idle",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AgentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AgentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AgentStatus::parse(&s).unwrap_or_default())
    }
}

/// Whether the anti-stall controller may act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    #[default]
    Running,
    Standby,
}

impl DriveMode {
    /// Normalize operator spellings (`on`/`off`, `true`/`false`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" | "run" | "on" | "enable" | "enabled" | "true" | "1" => {
                Some(DriveMode::Running)
            }
            "standby" | "idle" | "off" | "disable" | "disabled" | "false" | "0" => {
                Some(DriveMode::Standby)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Running => "running",
            DriveMode::Standby => "standby",
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DriveMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DriveMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DriveMode::parse(&s).unwrap_or_default())
    }
}

/// Lifecycle of a reply-needed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Open,
    Done,
    TimedOut,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Done => "done",
            RequestStatus::TimedOut => "timed_out",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, RequestStatus::Open)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-target state inside a reply-needed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    #[default]
    Pending,
    Replied,
    Blocked,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Pending => "pending",
            TargetStatus::Replied => "replied",
            TargetStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-subtree drive accounting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtreeStatus {
    #[default]
    Active,
    Stopped,
}

impl SubtreeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtreeStatus::Active => "active",
            SubtreeStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SubtreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
