// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI-server gateway
//!
//! Blocking RPCs against the CI server's plugin-facing API. The transport
//! multiplexes, so implementations are safe for concurrent use, unlike
//! executor clients.

use async_trait::async_trait;
use roster_core::{AgentId, CiAgentInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of the CI server, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub server_id: String,
    pub site_url: String,
}

#[derive(Debug, Clone, Error)]
pub enum CiServerError {
    #[error("ci server returned {code}: {message}")]
    Response { code: u16, message: String },
    #[error("ci server transport: {0}")]
    Transport(String),
}

/// The four operations the scheduler needs from the CI server.
#[async_trait]
pub trait CiServer: Send + Sync + 'static {
    async fn get_server_info(&self) -> Result<ServerInfo, CiServerError>;

    /// All registrations tagged to this plugin.
    async fn list_agents(&self) -> Result<Vec<CiAgentInfo>, CiServerError>;

    async fn disable_agents(&self, ids: &[AgentId]) -> Result<(), CiServerError>;

    /// The CI server rejects deletion of agents that are not Disabled;
    /// the state machine guarantees the ordering.
    async fn delete_agents(&self, ids: &[AgentId]) -> Result<(), CiServerError>;
}
