// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only views of the two external systems
//!
//! The reconciliation join feeds one of each (when present) into the state
//! machine per agent id. Neither type is ever mutated by the scheduler.

use crate::id::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task counts for one executor job, keyed by coarse task state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorJobSummary {
    pub agent_id: AgentId,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub active: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub finished: u32,
}

impl ExecutorJobSummary {
    /// A job is alive while any task is pending or active.
    pub fn alive(&self) -> bool {
        self.pending > 0 || self.active > 0
    }

    pub fn is_active(&self) -> bool {
        self.active > 0
    }

    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }
}

/// Latest task descriptor for an agent's job, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistory {
    pub status: String,
    pub events: Vec<TaskEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub at_ms: u64,
    pub status: String,
    pub message: String,
}

/// The CI server's configured enablement for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigState {
    Enabled,
    Disabled,
}

/// The CI server's observed health for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentHealth {
    Idle,
    Building,
    Missing,
    LostContact,
    Disabled,
}

impl fmt::Display for AgentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Building => write!(f, "Building"),
            Self::Missing => write!(f, "Missing"),
            Self::LostContact => write!(f, "LostContact"),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}

/// One registration row from the CI server's agent listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiAgentInfo {
    pub agent_id: AgentId,
    pub config_state: ConfigState,
    pub agent_state: AgentHealth,
}

impl CiAgentInfo {
    /// Registered means enabled and in contact.
    pub fn registered(&self) -> bool {
        self.config_state == ConfigState::Enabled
            && !matches!(self.agent_state, AgentHealth::Missing | AgentHealth::LostContact)
    }
}

#[cfg(test)]
#[path = "observe_tests.rs"]
mod tests;
