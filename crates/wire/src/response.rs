// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelope and fixed response bodies

use serde::{Deserialize, Serialize};

/// Status codes the CI server understands.
pub const SUCCESS: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const INTERNAL_ERROR: u16 = 500;

/// A plugin response: status code plus JSON (or literal) body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginResponse {
    pub code: u16,
    pub body: String,
}

impl PluginResponse {
    /// 200 with the given body.
    pub fn success(body: impl Into<String>) -> Self {
        Self { code: SUCCESS, body: body.into() }
    }

    /// 200 with an empty body.
    pub fn empty() -> Self {
        Self::success("")
    }

    /// 200 with a serialized JSON body.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::success(body),
            Err(e) => Self::error(format!("response serialization failed: {e}")),
        }
    }

    /// 400 with an error message body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { code: BAD_REQUEST, body: error_body(&message.into()) }
    }

    /// 500 with an error message body.
    pub fn error(message: impl Into<String>) -> Self {
        Self { code: INTERNAL_ERROR, body: error_body(&message.into()) }
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

/// `get-capabilities`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_plugin_status_report: bool,
    pub supports_cluster_status_report: bool,
    pub supports_agent_status_report: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_plugin_status_report: true,
            supports_cluster_status_report: true,
            supports_agent_status_report: true,
        }
    }
}

/// `get-icon`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconResponse {
    pub content_type: String,
    pub data: String,
}

/// HTML view wrapper for the status-report responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReportView {
    pub view: String,
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
