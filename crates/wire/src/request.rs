// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request bodies consumed by the plugin

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies the CI job an agent is requested for.
///
/// Only `job_id` drives scheduling decisions; the rest is display context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobIdentifier {
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub pipeline_counter: u64,
    #[serde(default)]
    pub pipeline_label: String,
    #[serde(default)]
    pub stage_name: String,
    #[serde(default)]
    pub stage_counter: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub job_id: u64,
}

/// `create-agent`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgentRequest {
    pub auto_register_key: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub cluster_profile_properties: HashMap<String, String>,
    #[serde(default)]
    pub elastic_agent_profile_properties: HashMap<String, String>,
    pub job_identifier: JobIdentifier,
}

/// The `agent` object inside `should-assign-work`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDescriptor {
    pub agent_id: String,
    #[serde(default)]
    pub agent_state: Option<String>,
    #[serde(default)]
    pub build_state: Option<String>,
    #[serde(default)]
    pub config_state: Option<String>,
}

/// `should-assign-work`
#[derive(Debug, Clone, Deserialize)]
pub struct ShouldAssignWorkRequest {
    pub agent: AgentDescriptor,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub cluster_profile_properties: HashMap<String, String>,
    #[serde(default)]
    pub elastic_agent_profile_properties: HashMap<String, String>,
    #[serde(default)]
    pub job_identifier: JobIdentifier,
}

/// `job-completion`
#[derive(Debug, Clone, Deserialize)]
pub struct JobCompletionRequest {
    pub elastic_agent_id: String,
    #[serde(default)]
    pub job_identifier: Option<JobIdentifier>,
}

/// `server-ping`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerPingRequest {
    #[serde(default)]
    pub all_cluster_profile_properties: Vec<HashMap<String, String>>,
}

/// `agent-status-report`, `cluster-status-report`, `plugin-status-report`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReportRequest {
    #[serde(default)]
    pub elastic_agent_id: Option<String>,
    #[serde(default)]
    pub cluster_profile_properties: Option<HashMap<String, String>>,
    #[serde(default)]
    pub all_cluster_profile_properties: Vec<HashMap<String, String>>,
    #[serde(default)]
    pub job_identifier: Option<JobIdentifier>,
}

/// One profile entry inside `migrate-config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileHolder {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plugin_id: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// `migrate-config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrateConfigRequest {
    #[serde(default)]
    pub cluster_profiles: Vec<ProfileHolder>,
    #[serde(default)]
    pub elastic_agent_profiles: Vec<ProfileHolder>,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
