// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_util::*;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roster_core::{AgentHealth, AgentState, ConfigState};
use serde_json::{json, Value};

#[tokio::test]
async fn get_icon_returns_svg_as_base64() {
    let h = harness();
    let response = h.plugin.handle("get-icon", "").await;
    assert_eq!(response.code, 200);

    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["content_type"], "image/svg+xml");
    let data = BASE64.decode(body["data"].as_str().unwrap()).unwrap();
    assert!(String::from_utf8(data).unwrap().contains("<svg"));
}

#[tokio::test]
async fn get_capabilities_supports_all_reports() {
    let h = harness();
    let response = h.plugin.handle("get-capabilities", "").await;
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["supports_plugin_status_report"], true);
    assert_eq!(body["supports_cluster_status_report"], true);
    assert_eq!(body["supports_agent_status_report"], true);
}

#[tokio::test]
async fn metadata_endpoints_list_profile_fields() {
    let h = harness();

    let response = h.plugin.handle("get-cluster-profile-metadata", "").await;
    let body: Value = serde_json::from_str(&response.body).unwrap();
    let keys: Vec<&str> =
        body.as_array().unwrap().iter().map(|f| f["key"].as_str().unwrap()).collect();
    assert!(keys.contains(&"executor_url"));
    assert!(keys.contains(&"cluster_name"));

    let response = h.plugin.handle("get-elastic-agent-profile-metadata", "").await;
    let body: Value = serde_json::from_str(&response.body).unwrap();
    let keys: Vec<&str> =
        body.as_array().unwrap().iter().map(|f| f["key"].as_str().unwrap()).collect();
    assert!(keys.contains(&"agent_tag"));
    assert!(keys.contains(&"cpu"));
}

#[tokio::test]
async fn validate_cluster_profile_reports_problems_as_data() {
    let h = harness();

    let response = h.plugin.handle("validate-cluster-profile", &cluster_props().to_string()).await;
    assert_eq!(response.code, 200);
    assert_eq!(response.body, "[]");

    let response = h.plugin.handle("validate-cluster-profile", "{}").await;
    assert_eq!(response.code, 200);
    let errors: Vec<Value> = serde_json::from_str(&response.body).unwrap();
    assert!(errors.iter().any(|e| e["key"] == "executor_url"));
    assert!(errors.iter().all(|e| e["message"].is_string()));
}

#[tokio::test]
async fn validate_agent_profile_enforces_ranges() {
    let h = harness();

    let response = h.plugin.handle("validate-elastic-agent-profile", &agent_props().to_string()).await;
    assert_eq!(response.body, "[]");

    let bad = json!({ "agent_tag": "build", "cpu": "64" }).to_string();
    let response = h.plugin.handle("validate-elastic-agent-profile", &bad).await;
    let errors: Vec<Value> = serde_json::from_str(&response.body).unwrap();
    assert!(errors.iter().any(|e| e["key"] == "cpu"));
}

#[tokio::test]
async fn migrate_config_normalizes_properties() {
    let h = harness();
    let body = json!({
        "cluster_profiles": [{
            "id": "dev",
            "plugin_id": "roster.elastic-agent",
            "properties": {
                "cluster_name": " aws-dev ",
                "obsolete_key": "x",
                "executor_url": "",
            },
        }],
        "elastic_agent_profiles": [{
            "id": "build",
            "properties": { "agent_tag": "build", "goagent_version": "19" },
        }],
    })
    .to_string();

    let response = h.plugin.handle("migrate-config", &body).await;
    assert_eq!(response.code, 200);
    let out: Value = serde_json::from_str(&response.body).unwrap();
    let props = &out["cluster_profiles"][0]["properties"];
    assert_eq!(props["cluster_name"], "aws-dev");
    assert!(props.get("obsolete_key").is_none());
    assert!(props.get("executor_url").is_none(), "blank values are dropped");
    let props = &out["elastic_agent_profiles"][0]["properties"];
    assert!(props.get("goagent_version").is_none());
}

#[tokio::test]
async fn should_assign_work_answers_with_literal_booleans() {
    let h = harness();

    // No record yet: false
    let ask = |resources: Value| {
        json!({
            "agent": { "agent_id": AGENT_ID },
            "environment": "prod",
            "cluster_profile_properties": cluster_props(),
            "elastic_agent_profile_properties": resources,
            "job_identifier": { "job_id": 7 },
        })
        .to_string()
    };
    let response = h.plugin.handle("should-assign-work", &ask(agent_props())).await;
    assert_eq!(response.body, "false");

    // Launch an agent with 1 cpu / 1024 MiB
    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;

    let response = h.plugin.handle("should-assign-work", &ask(agent_props())).await;
    assert_eq!(response.code, 200);
    assert_eq!(response.body, "true");

    // A bigger profile than the agent has: false
    let big = json!({ "agent_tag": "build", "cpu": "4.0", "ram": "8192" });
    let response = h.plugin.handle("should-assign-work", &ask(big)).await;
    assert_eq!(response.body, "false");
}

#[tokio::test]
async fn unknown_requests_and_bad_json_are_rejected() {
    let h = harness();

    let response = h.plugin.handle("go-agent-disco", "{}").await;
    assert_eq!(response.code, 400);
    assert!(response.body.contains("unknown request"));

    let response = h.plugin.handle("create-agent", "{not json").await;
    assert_eq!(response.code, 400);

    // Invalid cluster profile in create-agent
    let body = json!({
        "auto_register_key": "key",
        "cluster_profile_properties": {},
        "elastic_agent_profile_properties": agent_props(),
        "job_identifier": { "job_id": 1 },
    })
    .to_string();
    let response = h.plugin.handle("create-agent", &body).await;
    assert_eq!(response.code, 400);
}

#[tokio::test]
async fn agent_status_report_renders_the_record() {
    let h = harness();

    let response = h.plugin.handle("agent-status-report", "{}").await;
    assert_eq!(response.code, 400, "elastic_agent_id is required");

    let body = json!({ "elastic_agent_id": AGENT_ID }).to_string();
    let response = h.plugin.handle("agent-status-report", &body).await;
    assert_eq!(response.code, 200);
    let view: Value = serde_json::from_str(&response.body).unwrap();
    assert!(view["view"].as_str().unwrap().contains("No record"));

    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;

    let response = h.plugin.handle("agent-status-report", &body).await;
    let view: Value = serde_json::from_str(&response.body).unwrap();
    let html = view["view"].as_str().unwrap();
    assert!(html.contains("pending"));
    assert!(html.contains("job created"));
}

#[tokio::test]
async fn cluster_status_report_renders_quota_and_agents() {
    let h = harness();
    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;

    let body = json!({ "cluster_profile_properties": cluster_props() }).to_string();
    let response = h.plugin.handle("cluster-status-report", &body).await;
    assert_eq!(response.code, 200);
    let view: Value = serde_json::from_str(&response.body).unwrap();
    let html = view["view"].as_str().unwrap();
    assert!(html.contains("Cluster aws-dev"));
    assert!(html.contains("build-agent-0"));
}

#[tokio::test]
async fn plugin_status_report_summarizes_the_fleet() {
    let h = harness();
    h.ci.set_agents(vec![ci_agent(AGENT_ID, ConfigState::Enabled, AgentHealth::Idle)]);
    h.plugin.handle("create-agent", &create_agent_body(100)).await;
    h.wait_for_state(AGENT_ID, AgentState::Pending).await;

    let response = h.plugin.handle("plugin-status-report", "{}").await;
    assert_eq!(response.code, 200);
    let view: Value = serde_json::from_str(&response.body).unwrap();
    let html = view["view"].as_str().unwrap();
    assert!(html.contains("fake-server"));
    assert!(html.contains("1 cluster(s), 1 agent record(s)"));
}

#[tokio::test]
async fn server_ping_with_no_clusters_is_a_no_op() {
    let h = harness();
    let response = h.plugin.handle("server-ping", "{}").await;
    assert_eq!(response.code, 200);
    assert_eq!(response.body, "");
    h.plugin.store().barrier().await.unwrap();
    assert!(h.plugin.store().snapshot().clusters.is_empty());
}
