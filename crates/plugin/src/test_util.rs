// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for plugin tests

use crate::handler::Plugin;
use roster_adapters::fake::{FakeCiServer, FakeConnector, FakeExecutor};
use roster_core::{
    AgentHealth, AgentId, AgentState, CiAgentInfo, ConfigState, ExecutorJobSummary, FakeClock,
};
use serde_json::json;
use std::time::Duration;

pub const AGENT_ID: &str = "aws-dev/www/prod/build-agent-0";

/// A plugin wired to fakes, plus handles to script them.
pub struct Harness {
    pub plugin: Plugin<FakeConnector, FakeCiServer, FakeClock>,
    pub executor: FakeExecutor,
    pub ci: FakeCiServer,
    pub clock: FakeClock,
}

pub fn harness() -> Harness {
    let executor = FakeExecutor::new();
    let ci = FakeCiServer::new();
    let clock = FakeClock::new();
    let plugin = Plugin::new(FakeConnector::new(executor.clone()), ci.clone(), clock.clone());
    Harness { plugin, executor, ci, clock }
}

impl Harness {
    /// Current state of an agent record, if any.
    pub fn state_of(&self, id: &str) -> Option<AgentState> {
        self.plugin.store().snapshot().agents.get(id).map(|r| r.state)
    }

    pub async fn ping(&self) {
        let response = self.plugin.handle("server-ping", &ping_body()).await;
        assert_eq!(response.code, 200, "ping failed: {}", response.body);
    }

    /// Poll until the agent reaches `state`.
    pub async fn wait_for_state(&self, id: &str, state: AgentState) {
        wait_for(
            || match self.state_of(id) {
                Some(s) if s == state => Some(()),
                _ => None,
            },
            &format!("agent {id} to reach {state}"),
        )
        .await;
    }

    /// Poll until the agent record is gone.
    pub async fn wait_for_removal(&self, id: &str) {
        wait_for(
            || {
                if self.plugin.store().snapshot().agents.contains_key(id) {
                    None
                } else {
                    Some(())
                }
            },
            &format!("agent {id} to be forgotten"),
        )
        .await;
    }
}

/// Poll an assertion until it passes, for settling async effects.
pub async fn wait_for<T>(mut check: impl FnMut() -> Option<T>, what: &str) -> T {
    for _ in 0..400 {
        if let Some(value) = check() {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

pub fn cluster_props() -> serde_json::Value {
    json!({
        "executor_url": "http://x/api",
        "cluster_name": "aws-dev",
        "cluster_role": "www",
        "cluster_env": "prod",
        "server_api_url": "http://s/go",
    })
}

pub fn agent_props() -> serde_json::Value {
    json!({
        "agent_tag": "build",
        "cpu": "1.0",
        "ram": "1024",
        "disk": "1024",
        "environments": "prod",
    })
}

pub fn ping_body() -> String {
    json!({ "all_cluster_profile_properties": [cluster_props()] }).to_string()
}

pub fn create_agent_body(job_id: u64) -> String {
    json!({
        "auto_register_key": "register-key",
        "environment": "prod",
        "cluster_profile_properties": cluster_props(),
        "elastic_agent_profile_properties": agent_props(),
        "job_identifier": {
            "pipeline_name": "deploy",
            "pipeline_counter": 1,
            "stage_name": "package",
            "job_name": "build",
            "job_id": job_id,
        },
    })
    .to_string()
}

pub fn job_summary(id: &str, pending: u32, active: u32) -> ExecutorJobSummary {
    ExecutorJobSummary { agent_id: AgentId::new(id), pending, active, failed: 0, finished: 0 }
}

pub fn ci_agent(id: &str, config: ConfigState, health: AgentHealth) -> CiAgentInfo {
    CiAgentInfo { agent_id: AgentId::new(id), config_state: config, agent_state: health }
}
