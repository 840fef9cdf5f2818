// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation on each server ping
//!
//! Joins three sources of truth per agent id — our records, the CI server's
//! registrations, and each cluster's executor jobs — and enqueues one
//! state-machine step per id in the union. A failed executor fetch yields
//! an empty job list for that cluster: teardown transitions elsewhere keep
//! making progress, and nothing gets declared an orphan while the executor
//! is down (the no-record branch only fires on a job we can see).

use crate::store::{apply_outcome, ClusterEntry, Scheduler, Store, Transition};
use futures_util::future::join_all;
use roster_adapters::{CiServer, ExecutorConnector, ExecutorGateway};
use roster_core::{
    machine, AgentId, AgentKey, CiAgentInfo, Clock, ClusterProfile, ExecutorJobSummary,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One ping: sync cluster entries, fetch the external views, and fan out
/// per-id state-machine steps.
///
/// The CI-agent listing happens here, on the request thread, so the writer
/// never blocks on I/O.
pub async fn run_ping<F, S, C>(
    store: &Store,
    executors: &Arc<ExecutorGateway<F>>,
    ci: &Arc<S>,
    clock: &C,
    profiles: Vec<ClusterProfile>,
) -> Result<(), crate::HandlerError>
where
    F: ExecutorConnector,
    S: CiServer,
    C: Clock,
{
    let ci_agents: Vec<CiAgentInfo> = ci
        .list_agents()
        .await?
        .into_iter()
        .filter(|agent| AgentKey::parse(&agent.agent_id).is_some())
        .collect();

    let sync_profiles = profiles.clone();
    store.submit(Box::new(move |scheduler| {
        sync_clusters(scheduler, &sync_profiles);
        Vec::new()
    }))
    .await?;

    let keep: Vec<&str> = profiles.iter().map(|p| p.executor_url.as_str()).collect();
    executors.retain(&keep);

    let fetches = profiles.iter().map(|profile| {
        let executors = Arc::clone(executors);
        let store = store.clone();
        let profile = profile.clone();
        async move { fetch_cluster(&executors, &store, &profile).await }
    });
    let job_lists = join_all(fetches).await;

    let mut jobs_by_id: HashMap<AgentId, ExecutorJobSummary> = HashMap::new();
    for jobs in job_lists {
        for job in jobs {
            jobs_by_id.insert(job.agent_id.clone(), job);
        }
    }
    let mut ci_by_id: HashMap<AgentId, CiAgentInfo> = HashMap::new();
    for agent in ci_agents {
        ci_by_id.insert(agent.agent_id.clone(), agent);
    }

    let mut ids: HashSet<AgentId> = store.snapshot().agents.keys().cloned().collect();
    ids.extend(jobs_by_id.keys().cloned());
    ids.extend(ci_by_id.keys().cloned());

    for id in ids {
        let job = jobs_by_id.remove(&id);
        let ci_agent = ci_by_id.remove(&id);
        store.submit(step_transition(id, job, ci_agent, clock.clone())).await?;
    }
    Ok(())
}

/// One state-machine step for one id, run on the writer.
fn step_transition<C: Clock>(
    id: AgentId,
    job: Option<ExecutorJobSummary>,
    ci_agent: Option<CiAgentInfo>,
    clock: C,
) -> Transition {
    Box::new(move |scheduler| {
        // Adoption is limited to clusters we manage, so every record's
        // cluster segment stays resolvable to a cluster entry.
        if scheduler.agents.get(&id).is_none() {
            let known_cluster = AgentKey::parse(&id)
                .map(|key| scheduler.clusters.contains_key(&key.cluster))
                .unwrap_or(false);
            if !known_cluster {
                return Vec::new();
            }
        }
        let now_ms = clock.epoch_ms();
        let observation =
            machine::Observation { job: job.as_ref(), ci: ci_agent.as_ref() };
        let outcome = machine::manage(&id, scheduler.agents.get(&id), observation, now_ms);
        apply_outcome(scheduler, &id, outcome)
    })
}

/// Probe one cluster: quota first (enqueued as its own update), then the
/// job listing, which joins the reconcile step. Failures degrade to a
/// warning and an empty list.
async fn fetch_cluster<F: ExecutorConnector>(
    executors: &ExecutorGateway<F>,
    store: &Store,
    profile: &ClusterProfile,
) -> Vec<ExecutorJobSummary> {
    match executors.get_quota(&profile.executor_url, &profile.role).await {
        Ok(quota) => {
            let cluster_name = profile.cluster_name.clone();
            let update: Transition = Box::new(move |scheduler| {
                if let Some(entry) = scheduler.clusters.get_mut(&cluster_name) {
                    entry.quota = Some(quota);
                }
                Vec::new()
            });
            if store.submit(update).await.is_err() {
                return Vec::new();
            }
        }
        Err(e) => {
            tracing::warn!(cluster = %profile.cluster_name, error = %e, "quota probe failed");
        }
    }

    match executors.list_jobs(&profile.executor_url, &profile.role, &profile.env).await {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::warn!(
                cluster = %profile.cluster_name,
                error = %e,
                "job listing failed, treating as empty"
            );
            Vec::new()
        }
    }
}

/// Upsert entries for current profiles; drop clusters (and their agent
/// records) whose profiles disappeared.
fn sync_clusters(scheduler: &mut Scheduler, profiles: &[ClusterProfile]) {
    for profile in profiles {
        scheduler
            .clusters
            .entry(profile.cluster_name.clone())
            .and_modify(|entry| {
                entry.executor_url.clone_from(&profile.executor_url);
                entry.role.clone_from(&profile.role);
                entry.env.clone_from(&profile.env);
            })
            .or_insert_with(|| ClusterEntry {
                executor_url: profile.executor_url.clone(),
                role: profile.role.clone(),
                env: profile.env.clone(),
                quota: None,
            });
    }

    let current: HashSet<&str> = profiles.iter().map(|p| p.cluster_name.as_str()).collect();
    let before = scheduler.clusters.len();
    scheduler.clusters.retain(|name, _| current.contains(name.as_str()));
    if scheduler.clusters.len() != before {
        scheduler.agents.retain(|id, record| {
            let keep = AgentKey::parse(id)
                .map(|key| current.contains(key.cluster.as_str()))
                .unwrap_or(false);
            if !keep {
                tracing::warn!(agent = %id, state = %record.state, "cluster profile gone, dropping record");
            }
            keep
        });
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
