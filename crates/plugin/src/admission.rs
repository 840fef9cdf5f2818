// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission logic
//!
//! Decides whether a `create-agent` request launches anything, allocates
//! agent names, and answers `should-assign-work` from a snapshot.

use crate::store::Scheduler;
use roster_core::machine::LAUNCH_TIMEOUT;
use roster_core::{id, AgentId, AgentKey, AgentRecord, AgentState, ClusterProfile, Resources};

/// A parsed `create-agent` request, resources already resolved.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub job_id: u64,
    pub environment: Option<String>,
    pub resources: Resources,
}

/// Why a request did or did not launch an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing covers the job: launch a new agent.
    Launch,
    /// An agent launched for this job is still on its way.
    LaunchInFlight(AgentId),
    /// A running idle agent can take the job.
    IdleCapacity(AgentId),
    /// The cluster's quota cannot admit the request.
    QuotaExhausted,
}

/// Should a new agent be created for this request?
///
/// The launch de-dup check is the load-bearing one: without it the plugin
/// launches one agent per ping until the first one registers.
pub fn should_create_agent(
    scheduler: &Scheduler,
    cluster_name: &str,
    request: &AgentRequest,
    now_ms: u64,
) -> Decision {
    let in_flight = scheduler.agents.iter().find(|(_, record)| {
        record.launched_for == Some(request.job_id)
            && record.state.is_launch()
            && !record.stale(now_ms, LAUNCH_TIMEOUT)
    });
    if let Some((id, _)) = in_flight {
        return Decision::LaunchInFlight(id.clone());
    }

    let idle = scheduler.agents.iter().find(|(id, record)| {
        in_cluster(id, cluster_name)
            && record.state == AgentState::Running
            && record.idle
            && matches_environment(record, request.environment.as_deref())
            && record.resources.satisfies(&request.resources)
    });
    if let Some((id, _)) = idle {
        return Decision::IdleCapacity(id.clone());
    }

    if let Some(quota) = scheduler.clusters.get(cluster_name).and_then(|c| c.quota) {
        if !quota.admits(&request.resources) {
            return Decision::QuotaExhausted;
        }
    }

    Decision::Launch
}

/// Smallest free index for a `tag-agent-N` name in the cluster.
pub fn allocate_agent_name(
    scheduler: &Scheduler,
    profile: &ClusterProfile,
    tag: &str,
) -> (AgentId, String) {
    let mut index = 0u32;
    loop {
        let name = id::agent_name(tag, index);
        let agent_id = AgentKey::form(&profile.cluster_name, &profile.role, &profile.env, &name);
        if !scheduler.agents.contains_key(&agent_id) {
            return (agent_id, name);
        }
        index += 1;
    }
}

/// Synchronous read path: can this agent take a job needing `required`?
pub fn should_assign_work(scheduler: &Scheduler, agent_id: &str, required: &Resources) -> bool {
    scheduler
        .agents
        .get(agent_id)
        .map(|record| record.resources.satisfies(required))
        .unwrap_or(false)
}

/// An agent matches a request environment when the environment is in its
/// set; a request without an environment matches any agent.
fn matches_environment(record: &AgentRecord, environment: Option<&str>) -> bool {
    match environment {
        None => true,
        Some(env) => record.environments.iter().any(|e| e == env),
    }
}

fn in_cluster(id: &AgentId, cluster_name: &str) -> bool {
    AgentKey::parse(id).is_some_and(|key| key.cluster == cluster_name)
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
