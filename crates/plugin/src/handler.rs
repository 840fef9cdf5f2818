// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-name dispatch for the CI server's plugin API
//!
//! [`Plugin::handle`] is the single entry point: the CI server names a
//! request and supplies a JSON body, and gets back a status code and body.
//! Every dispatch is wrapped in a catch-all that maps errors to an error
//! response; only validation results travel as data.

use crate::dispatch::Dispatcher;
use crate::error::HandlerError;
use crate::launch::{self, LaunchRequest};
use crate::reconcile;
use crate::store::{self, Store};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roster_adapters::{CiServer, ExecutorConnector, ExecutorGateway};
use roster_core::{AgentId, AgentProfile, AgentRecord, Clock, ClusterProfile};
use roster_wire::{
    cluster_profile_metadata, elastic_agent_profile_metadata, normalize_properties, request,
    Capabilities, IconResponse, PluginResponse, StatusReportView,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity the containing process reports to the CI server.
pub const PLUGIN_ID: &str = "roster.elastic-agent";
pub const PLUGIN_KIND: &str = "elastic-agent";
pub const API_VERSION: &str = "5.0";

const ICON_SVG: &str = include_str!("../assets/icon.svg");

// Request names, bit-exact.
const GET_ICON: &str = "get-icon";
const GET_CAPABILITIES: &str = "get-capabilities";
const MIGRATE_CONFIG: &str = "migrate-config";
const GET_CLUSTER_PROFILE_METADATA: &str = "get-cluster-profile-metadata";
const GET_AGENT_PROFILE_METADATA: &str = "get-elastic-agent-profile-metadata";
const VALIDATE_CLUSTER_PROFILE: &str = "validate-cluster-profile";
const VALIDATE_AGENT_PROFILE: &str = "validate-elastic-agent-profile";
const SERVER_PING: &str = "server-ping";
const CREATE_AGENT: &str = "create-agent";
const SHOULD_ASSIGN_WORK: &str = "should-assign-work";
const JOB_COMPLETION: &str = "job-completion";
const AGENT_STATUS_REPORT: &str = "agent-status-report";
const CLUSTER_STATUS_REPORT: &str = "cluster-status-report";
const PLUGIN_STATUS_REPORT: &str = "plugin-status-report";

/// The elastic-agent scheduler plugin.
///
/// Owns the single-writer store, the effect dispatcher, and the two
/// gateways. Must be created inside a tokio runtime; `new` spawns the
/// writer task.
pub struct Plugin<F: ExecutorConnector, S: CiServer, C: Clock> {
    store: Store,
    executors: Arc<ExecutorGateway<F>>,
    ci: Arc<S>,
    clock: C,
}

impl<F: ExecutorConnector, S: CiServer, C: Clock> Plugin<F, S, C> {
    pub fn new(connector: F, ci: S, clock: C) -> Self {
        let executors = Arc::new(ExecutorGateway::new(connector));
        let ci = Arc::new(ci);
        let (store, rx) = Store::new();
        let dispatcher =
            Dispatcher::new(Arc::clone(&executors), Arc::clone(&ci), store.clone(), clock.clone());
        store::spawn_writer(rx, &store, Box::new(dispatcher));
        Self { store, executors, ci, clock }
    }

    /// Read access to the store, for embedding code and tests.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handle one plugin request.
    pub async fn handle(&self, request_name: &str, body: &str) -> PluginResponse {
        match self.dispatch(request_name, body).await {
            Ok(response) => response,
            Err(e @ (HandlerError::BadRequest(_) | HandlerError::UnknownRequest(_))) => {
                tracing::warn!(request = request_name, error = %e, "rejected request");
                PluginResponse::bad_request(e.to_string())
            }
            Err(e) => {
                tracing::error!(request = request_name, error = %e, "request failed");
                PluginResponse::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request_name: &str, body: &str) -> Result<PluginResponse, HandlerError> {
        match request_name {
            GET_ICON => Ok(PluginResponse::json(&IconResponse {
                content_type: "image/svg+xml".to_string(),
                data: BASE64.encode(ICON_SVG),
            })),

            GET_CAPABILITIES => Ok(PluginResponse::json(&Capabilities::default())),

            GET_CLUSTER_PROFILE_METADATA => Ok(PluginResponse::json(&cluster_profile_metadata())),

            GET_AGENT_PROFILE_METADATA => {
                Ok(PluginResponse::json(&elastic_agent_profile_metadata()))
            }

            VALIDATE_CLUSTER_PROFILE => {
                let props: HashMap<String, String> = parse_body(body)?;
                Ok(PluginResponse::json(&ClusterProfile::validate(&props)))
            }

            VALIDATE_AGENT_PROFILE => {
                let props: HashMap<String, String> = parse_body(body)?;
                Ok(PluginResponse::json(&AgentProfile::validate(&props)))
            }

            MIGRATE_CONFIG => {
                let mut config: request::MigrateConfigRequest = parse_body(body)?;
                let cluster_fields = cluster_profile_metadata();
                let agent_fields = elastic_agent_profile_metadata();
                for profile in &mut config.cluster_profiles {
                    profile.properties =
                        normalize_properties(&profile.properties, &cluster_fields);
                }
                for profile in &mut config.elastic_agent_profiles {
                    profile.properties = normalize_properties(&profile.properties, &agent_fields);
                }
                Ok(PluginResponse::json(&config))
            }

            SERVER_PING => {
                let ping: request::ServerPingRequest = parse_body(body)?;
                let profiles = parse_cluster_profiles(&ping.all_cluster_profile_properties);
                reconcile::run_ping(&self.store, &self.executors, &self.ci, &self.clock, profiles)
                    .await?;
                Ok(PluginResponse::empty())
            }

            CREATE_AGENT => {
                let create: request::CreateAgentRequest = parse_body(body)?;
                let cluster = ClusterProfile::from_properties(&create.cluster_profile_properties)
                    .map_err(|e| HandlerError::BadRequest(e.to_string()))?;
                let agent =
                    AgentProfile::from_properties(&create.elastic_agent_profile_properties)
                        .map_err(|e| HandlerError::BadRequest(e.to_string()))?;
                let request = LaunchRequest {
                    cluster,
                    agent,
                    auto_register_key: create.auto_register_key,
                    environment: create.environment,
                    job_id: create.job_identifier.job_id,
                };
                self.store
                    .submit(launch::request_new_agent(request, self.clock.clone()))
                    .await?;
                Ok(PluginResponse::empty())
            }

            SHOULD_ASSIGN_WORK => {
                let ask: request::ShouldAssignWorkRequest = parse_body(body)?;
                let answer = match AgentProfile::from_properties(
                    &ask.elastic_agent_profile_properties,
                ) {
                    Ok(profile) => {
                        let snapshot = self.store.snapshot();
                        crate::admission::should_assign_work(
                            &snapshot,
                            &ask.agent.agent_id,
                            &profile.resources(),
                        )
                    }
                    Err(e) => {
                        tracing::warn!(agent = %ask.agent.agent_id, error = %e, "invalid profile");
                        false
                    }
                };
                Ok(PluginResponse::success(if answer { "true" } else { "false" }))
            }

            JOB_COMPLETION => {
                let done: request::JobCompletionRequest = parse_body(body)?;
                let id = AgentId::new(done.elastic_agent_id);
                let now_ms = self.clock.epoch_ms();
                self.store
                    .submit(Box::new(move |scheduler| {
                        if let Some(record) = scheduler.agents.get_mut(&id) {
                            record.mark_active(now_ms);
                        }
                        Vec::new()
                    }))
                    .await?;
                Ok(PluginResponse::empty())
            }

            AGENT_STATUS_REPORT => self.agent_status_report(body).await,

            CLUSTER_STATUS_REPORT => {
                let report: request::StatusReportRequest = parse_body(body)?;
                let props = report.cluster_profile_properties.ok_or_else(|| {
                    HandlerError::BadRequest("cluster_profile_properties is required".into())
                })?;
                let cluster = ClusterProfile::from_properties(&props)
                    .map_err(|e| HandlerError::BadRequest(e.to_string()))?;
                let snapshot = self.store.snapshot();
                let agents: Vec<&AgentRecord> = snapshot
                    .agents
                    .values()
                    .filter(|r| {
                        r.agent_id.as_str().starts_with(&format!("{}/", cluster.cluster_name))
                    })
                    .collect();
                let view = crate::view::cluster_report(
                    &cluster.cluster_name,
                    snapshot.clusters.get(&cluster.cluster_name),
                    &agents,
                    self.clock.epoch_ms(),
                );
                Ok(PluginResponse::json(&StatusReportView { view }))
            }

            PLUGIN_STATUS_REPORT => {
                let server = match self.ci.get_server_info().await {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::warn!(error = %e, "server info unavailable");
                        None
                    }
                };
                let snapshot = self.store.snapshot();
                let view = crate::view::plugin_report(
                    server.as_ref(),
                    &snapshot,
                    self.clock.epoch_ms(),
                );
                Ok(PluginResponse::json(&StatusReportView { view }))
            }

            other => Err(HandlerError::UnknownRequest(other.to_string())),
        }
    }

    async fn agent_status_report(&self, body: &str) -> Result<PluginResponse, HandlerError> {
        let report: request::StatusReportRequest = parse_body(body)?;
        let agent_id = report
            .elastic_agent_id
            .ok_or_else(|| HandlerError::BadRequest("elastic_agent_id is required".into()))?;
        let id = AgentId::new(agent_id.clone());

        let snapshot = self.store.snapshot();
        let record = snapshot.agents.get(&id);

        let history = match snapshot.cluster_of(&id) {
            Some(entry) => {
                match self.executors.get_task_history(&entry.executor_url, &id).await {
                    Ok(history) => Some(history),
                    Err(e) => {
                        tracing::warn!(agent = %id, error = %e, "task history unavailable");
                        None
                    }
                }
            }
            None => None,
        };

        let view = crate::view::agent_report(
            &agent_id,
            record,
            history.as_ref(),
            self.clock.epoch_ms(),
        );
        Ok(PluginResponse::json(&StatusReportView { view }))
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, HandlerError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| HandlerError::BadRequest(e.to_string()))
}

/// Parse the ping's cluster property maps, skipping invalid ones so the
/// rest of the fleet still reconciles.
fn parse_cluster_profiles(all: &[HashMap<String, String>]) -> Vec<ClusterProfile> {
    let mut profiles = Vec::new();
    for props in all {
        match ClusterProfile::from_properties(props) {
            Ok(profile) => profiles.push(profile),
            Err(e) => tracing::warn!(error = %e, "skipping invalid cluster profile"),
        }
    }
    profiles
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
