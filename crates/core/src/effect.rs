// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent side effects the scheduler needs to perform
//!
//! Effects are plain values, never closures over the store: the state
//! machine emits them, the dispatcher executes them off the writer, and the
//! follow-up payloads say how to re-enter the writer on completion.

use crate::id::AgentId;
use crate::profile::ClusterProfile;
use crate::record::AgentState;
use crate::resources::Resources;
use serde::{Deserialize, Serialize};

/// State update enqueued to the writer when an effect completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub state: AgentState,
    pub message: String,
}

impl FollowUp {
    pub fn new(state: AgentState, message: impl Into<String>) -> Self {
        Self { state, message: message.into() }
    }
}

/// Everything needed to create the executor job for a new agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub cluster: ClusterProfile,
    pub agent_name: String,
    pub resources: Resources,
    pub environments: Vec<String>,
    pub auto_register_key: String,
    pub init_script: Option<String>,
}

/// What an effect does when it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Create the executor job for a newly requested agent
    CreateJob(Box<LaunchSpec>),
    /// Kill the agent's executor job
    KillJob { reason: String },
    /// Disable the agent's CI registration so it stops taking work
    DisableAgent,
    /// Delete the agent's CI registration (must already be disabled)
    DeleteAgent,
}

/// A side effect tagged with the agent it belongs to and the state updates
/// to apply on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub agent_id: AgentId,
    pub kind: EffectKind,
    pub on_success: FollowUp,
    /// Absent for most effects: a failure is logged and the staleness edge
    /// retries on a later ping.
    pub on_failure: Option<FollowUp>,
}

impl Effect {
    pub fn create_job(agent_id: AgentId, spec: LaunchSpec) -> Self {
        Self {
            agent_id,
            kind: EffectKind::CreateJob(Box::new(spec)),
            on_success: FollowUp::new(AgentState::Pending, "job created"),
            on_failure: Some(FollowUp::new(AgentState::Failed, "create failed")),
        }
    }

    pub fn kill_job(agent_id: AgentId, reason: impl Into<String>) -> Self {
        Self {
            agent_id,
            kind: EffectKind::KillJob { reason: reason.into() },
            on_success: FollowUp::new(AgentState::Killed, "executor job killed"),
            on_failure: None,
        }
    }

    pub fn disable_agent(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            kind: EffectKind::DisableAgent,
            on_success: FollowUp::new(AgentState::Draining, "agent disabled"),
            on_failure: None,
        }
    }

    pub fn delete_agent(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            kind: EffectKind::DeleteAgent,
            on_success: FollowUp::new(AgentState::Terminated, "agent deleted"),
            on_failure: None,
        }
    }

    /// Effect name for log spans (e.g., "create_job", "kill_job")
    pub fn name(&self) -> &'static str {
        match &self.kind {
            EffectKind::CreateJob(_) => "create_job",
            EffectKind::KillJob { .. } => "kill_job",
            EffectKind::DisableAgent => "disable_agent",
            EffectKind::DeleteAgent => "delete_agent",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("agent_id", self.agent_id.to_string())];
        match &self.kind {
            EffectKind::CreateJob(spec) => {
                fields.push(("cluster", spec.cluster.cluster_name.clone()));
                fields.push(("resources", spec.resources.to_string()));
            }
            EffectKind::KillJob { reason } => fields.push(("reason", reason.clone())),
            EffectKind::DisableAgent | EffectKind::DeleteAgent => {}
        }
        fields
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
