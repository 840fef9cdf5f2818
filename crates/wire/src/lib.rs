// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! roster-wire: CI-server plugin protocol types
//!
//! Serde bodies for every request the plugin handles, the response
//! envelope, and the declarative profile-field metadata. Transport framing
//! is the CI server's concern.

pub mod metadata;
pub mod request;
pub mod response;

pub use metadata::{
    cluster_profile_metadata, elastic_agent_profile_metadata, normalize_properties, ProfileField,
};
pub use request::{
    AgentDescriptor, CreateAgentRequest, JobCompletionRequest, JobIdentifier,
    MigrateConfigRequest, ProfileHolder, ServerPingRequest, ShouldAssignWorkRequest,
    StatusReportRequest,
};
pub use response::{Capabilities, IconResponse, PluginResponse, StatusReportView};
