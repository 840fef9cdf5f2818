// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! New-agent launch flow
//!
//! Builds the transition a `create-agent` request enqueues: admission,
//! name allocation, the `launching` record, and the create-job effect.

use crate::admission::{self, AgentRequest, Decision};
use crate::store::{ClusterEntry, Transition};
use roster_core::{
    AgentProfile, AgentRecord, AgentState, Clock, ClusterProfile, Effect, LaunchSpec,
};

/// Inputs carried from the request into the writer.
pub struct LaunchRequest {
    pub cluster: ClusterProfile,
    pub agent: AgentProfile,
    pub auto_register_key: String,
    pub environment: Option<String>,
    pub job_id: u64,
}

/// The transition `create-agent` enqueues to the writer.
pub fn request_new_agent<C: Clock>(request: LaunchRequest, clock: C) -> Transition {
    Box::new(move |scheduler| {
        let LaunchRequest { cluster, agent, auto_register_key, environment, job_id } = request;

        // The first ping may not have run yet; make sure the cluster entry
        // exists before admission consults its quota.
        scheduler
            .clusters
            .entry(cluster.cluster_name.clone())
            .and_modify(|entry| entry.executor_url.clone_from(&cluster.executor_url))
            .or_insert_with(|| ClusterEntry {
                executor_url: cluster.executor_url.clone(),
                role: cluster.role.clone(),
                env: cluster.env.clone(),
                quota: None,
            });

        let now_ms = clock.epoch_ms();
        let resources = agent.resources();
        let admission_request =
            AgentRequest { job_id, environment: environment.clone(), resources };

        match admission::should_create_agent(
            scheduler,
            &cluster.cluster_name,
            &admission_request,
            now_ms,
        ) {
            Decision::Launch => {}
            decision => {
                tracing::info!(job_id, ?decision, "not launching an agent");
                return Vec::new();
            }
        }

        let (agent_id, agent_name) =
            admission::allocate_agent_name(scheduler, &cluster, &agent.tag);

        let mut environments = agent.environments.clone();
        if let Some(env) = &environment {
            if !environments.iter().any(|e| e == env) {
                environments.push(env.clone());
            }
        }

        let mut record = AgentRecord::init(
            agent_id.clone(),
            AgentState::Launching,
            environments.clone(),
            resources,
            now_ms,
            format!("agent requested for job {job_id}"),
        );
        record.launched_for = Some(job_id);

        tracing::info!(agent = %agent_id, job_id, %resources, "launching new agent");
        scheduler.agents.insert(agent_id.clone(), record);

        let spec = LaunchSpec {
            cluster,
            agent_name,
            resources,
            environments,
            auto_register_key,
            init_script: agent.init_script,
        };
        vec![Effect::create_job(agent_id, spec)]
    })
}
