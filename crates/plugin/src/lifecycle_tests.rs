// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lifecycle scenarios against fake gateways

use crate::test_util::*;
use roster_adapters::{ExecutorError, ResponseCode};
use roster_core::{AgentHealth, AgentState, ConfigState, Clock};
use std::time::Duration;

#[tokio::test]
async fn cold_launch_reaches_running() {
    let h = harness();

    let response = h.plugin.handle("create-agent", &create_agent_body(100)).await;
    assert_eq!(response.code, 200);

    // Record appears launching and the create effect lands it in pending
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;
    let created = h.executor.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].key.name, "build-agent-0");
    assert_eq!(created[0].key.role, "www");
    let names: Vec<&str> = created[0].task.processes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["install", "configure", "run"]);

    let record = h.plugin.store().snapshot().agents[AGENT_ID].clone();
    assert_eq!(record.launched_for, Some(100));
    assert_eq!(record.resources.ram_mb, 1024);

    // Executor reports the task active
    h.executor.set_jobs(vec![job_summary(AGENT_ID, 0, 1)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Starting).await;

    // CI server reports the registration
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Enabled, AgentHealth::Idle)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Running).await;
    let record = h.plugin.store().snapshot().agents[AGENT_ID].clone();
    assert_eq!(record.launched_for, None);
}

#[tokio::test]
async fn duplicate_create_requests_are_deduplicated() {
    let h = harness();

    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;

    let response = h.plugin.handle("create-agent", &create_agent_body(100)).await;
    assert_eq!(response.code, 200);
    h.plugin.store().barrier().await.unwrap();

    assert_eq!(h.plugin.store().snapshot().agents.len(), 1, "no second record");
    assert_eq!(h.executor.created().len(), 1, "no second executor job");

    // A different job does launch a second agent
    h.plugin.handle("create-agent", &create_agent_body(101)).await;
    wait_for(
        || (h.plugin.store().snapshot().agents.len() == 2).then_some(()),
        "second agent for a different job",
    )
    .await;
    assert!(h.plugin.store().snapshot().agents.contains_key("aws-dev/www/prod/build-agent-1"));
}

#[tokio::test]
async fn idle_agent_retires_through_the_teardown_chain() {
    let h = harness();

    // Bring one agent to running
    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;
    h.executor.set_jobs(vec![job_summary(AGENT_ID, 0, 1)]);
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Enabled, AgentHealth::Idle)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Running).await;

    // First idle observation marks the record; the next ping past the
    // window retires it
    h.ping().await;
    wait_for(
        || h.plugin.store().snapshot().agents[AGENT_ID].idle.then_some(()),
        "record marked idle",
    )
    .await;
    h.clock.advance(Duration::from_secs(301));
    h.ping().await;

    // retiring -> draining once the disable lands
    h.wait_for_state(AGENT_ID, AgentState::Draining).await;
    assert_eq!(h.ci.disabled(), vec![roster_core::AgentId::new(AGENT_ID)]);

    // Drained: the next ping kills the executor job
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Disabled, AgentHealth::Idle)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Killed).await;
    let killed = h.executor.killed();
    assert_eq!(killed.len(), 1);
    assert_eq!(killed[0].0.name, "build-agent-0");

    // Job is gone: delete the registration and terminate
    h.executor.set_jobs(vec![]);
    h.ci.set_agents(vec![]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Terminated).await;
    assert_eq!(h.ci.deleted(), vec![roster_core::AgentId::new(AGENT_ID)]);

    // The terminal record ages out
    h.clock.advance(Duration::from_secs(301));
    h.ping().await;
    h.wait_for_removal(AGENT_ID).await;
}

#[tokio::test]
async fn orphaned_executor_jobs_are_reaped() {
    let h = harness();
    let orphan = "aws-dev/www/prod/test-agent-7";

    // Kill fails at first: the record stays orphan and retries
    h.executor.state.lock().fail_kill = true;
    h.executor.set_jobs(vec![job_summary(orphan, 0, 1)]);
    h.ping().await;
    h.wait_for_state(orphan, AgentState::Orphan).await;

    // Still failing after the retry window: state holds, event refreshes
    h.clock.advance(Duration::from_secs(61));
    h.ping().await;
    h.plugin.store().barrier().await.unwrap();
    assert_eq!(h.state_of(orphan), Some(AgentState::Orphan));

    // Kill goes through on the next retry
    h.executor.state.lock().fail_kill = false;
    h.clock.advance(Duration::from_secs(61));
    h.ping().await;
    h.wait_for_state(orphan, AgentState::Killed).await;
    assert_eq!(h.executor.killed().len(), 1);
}

#[tokio::test]
async fn legacy_registrations_are_adopted_and_drained() {
    let h = harness();
    let legacy = "aws-dev/www/prod/old-agent-3";

    h.ci.set_agents(vec![ci_agent(legacy, ConfigState::Enabled, AgentHealth::Idle)]);
    h.ping().await;

    // Adopted, then the disable lands
    h.wait_for_state(legacy, AgentState::Draining).await;
    assert_eq!(h.ci.disabled(), vec![roster_core::AgentId::new(legacy)]);

    // Idle and disabled: the retirement chain takes over
    h.ci.set_agents(vec![ci_agent(legacy, ConfigState::Disabled, AgentHealth::Idle)]);
    h.ping().await;
    h.wait_for_state(legacy, AgentState::Killed).await;
}

#[tokio::test]
async fn create_failure_fails_the_record_with_the_error() {
    let h = harness();
    h.executor.state.lock().fail_create =
        Some(ExecutorError::new(ResponseCode::InvalidRequest, "malformed task"));

    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Failed).await;

    let record = h.plugin.store().snapshot().agents[AGENT_ID].clone();
    let message = &record.last_event().unwrap().message;
    assert!(message.contains("create failed"), "{message}");
    assert!(message.contains("INVALID_REQUEST"), "{message}");
    assert!(message.contains("malformed task"), "{message}");

    // Failed records take no further effects and age out
    h.clock.advance(Duration::from_secs(601));
    h.ping().await;
    h.wait_for_removal(AGENT_ID).await;
    assert_eq!(h.executor.created().len(), 0);
    assert!(h.executor.killed().is_empty());
}

#[tokio::test]
async fn executor_outage_does_not_orphan_known_agents() {
    let h = harness();

    // A running agent...
    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;
    h.executor.set_jobs(vec![job_summary(AGENT_ID, 0, 1)]);
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Enabled, AgentHealth::Building)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Running).await;

    // ...stays running through an executor outage: the failed listing is
    // treated as empty, and running transitions key off the CI view
    h.executor.state.lock().fail_list = true;
    h.ping().await;
    h.plugin.store().barrier().await.unwrap();
    assert_eq!(h.state_of(AGENT_ID), Some(AgentState::Running));
}

#[tokio::test]
async fn job_completion_refreshes_activity() {
    let h = harness();

    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Enabled, AgentHealth::Idle)]);
    h.ping().await;
    h.wait_for_state(AGENT_ID, AgentState::Running).await;

    // Mark idle via a ping, then a completed job resets the clock
    h.ping().await;
    wait_for(
        || h.plugin.store().snapshot().agents[AGENT_ID].idle.then_some(()),
        "record marked idle",
    )
    .await;

    let body = serde_json::json!({ "elastic_agent_id": AGENT_ID }).to_string();
    let response = h.plugin.handle("job-completion", &body).await;
    assert_eq!(response.code, 200);
    h.plugin.store().barrier().await.unwrap();

    let record = h.plugin.store().snapshot().agents[AGENT_ID].clone();
    assert!(!record.idle);
    assert_eq!(record.last_active_ms, Some(h.clock.epoch_ms()));
}
