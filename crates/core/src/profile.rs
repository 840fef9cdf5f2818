// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster and agent profiles
//!
//! Profiles arrive from the CI server as flat string-property maps on every
//! call; the scheduler keeps no copy beyond what is embedded in records.

use crate::resources::Resources;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Property keys for cluster profiles.
pub mod cluster_keys {
    pub const EXECUTOR_URL: &str = "executor_url";
    pub const CLUSTER_NAME: &str = "cluster_name";
    pub const CLUSTER_ROLE: &str = "cluster_role";
    pub const CLUSTER_ENV: &str = "cluster_env";
    pub const SERVER_API_URL: &str = "server_api_url";
    pub const AGENT_SOURCE_URL: &str = "agent_source_url";
}

/// Property keys for elastic agent profiles.
pub mod agent_keys {
    pub const AGENT_TAG: &str = "agent_tag";
    pub const ENVIRONMENTS: &str = "environments";
    pub const CPU: &str = "cpu";
    pub const RAM: &str = "ram";
    pub const DISK: &str = "disk";
    pub const INIT_SCRIPT: &str = "init_script";
}

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+$").expect("constant regex pattern is valid"));

/// A single invalid profile field, in the shape the CI server's
/// `validate-*` responses expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

impl FieldError {
    pub fn new(key: &str, message: impl Into<String>) -> Self {
        Self { key: key.to_string(), message: message.into() }
    }
}

/// Error constructing a profile from a property map.
#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    #[error("invalid profile: {}", .0.iter().map(|e| format!("{}: {}", e.key, e.message)).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<FieldError>),
}

/// A named target executor instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub executor_url: String,
    pub cluster_name: String,
    pub role: String,
    pub env: String,
    pub server_api_url: String,
    pub agent_source_url: Option<String>,
}

impl ClusterProfile {
    /// Validate a raw property map, returning every problem found.
    pub fn validate(props: &HashMap<String, String>) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for key in [
            cluster_keys::EXECUTOR_URL,
            cluster_keys::CLUSTER_NAME,
            cluster_keys::CLUSTER_ROLE,
            cluster_keys::CLUSTER_ENV,
            cluster_keys::SERVER_API_URL,
        ] {
            if props.get(key).map_or(true, |v| v.trim().is_empty()) {
                errors.push(FieldError::new(key, format!("{key} must not be blank")));
            }
        }
        for key in [cluster_keys::EXECUTOR_URL, cluster_keys::SERVER_API_URL] {
            if let Some(v) = props.get(key) {
                let v = v.trim();
                if !v.is_empty() && !v.starts_with("http://") && !v.starts_with("https://") {
                    errors.push(FieldError::new(key, format!("{key} must be an http(s) URL")));
                }
            }
        }
        errors
    }

    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ProfileError> {
        let errors = Self::validate(props);
        if !errors.is_empty() {
            return Err(ProfileError::Invalid(errors));
        }
        let get = |key: &str| props.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Ok(Self {
            executor_url: get(cluster_keys::EXECUTOR_URL),
            cluster_name: get(cluster_keys::CLUSTER_NAME),
            role: get(cluster_keys::CLUSTER_ROLE),
            env: get(cluster_keys::CLUSTER_ENV),
            server_api_url: get(cluster_keys::SERVER_API_URL),
            agent_source_url: props
                .get(cluster_keys::AGENT_SOURCE_URL)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from),
        })
    }
}

/// A named recipe for an agent: tag, resources, and an optional init script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub tag: String,
    pub environments: Vec<String>,
    pub cpu: Option<f64>,
    pub ram_mb: Option<u64>,
    pub disk_mb: Option<u64>,
    pub init_script: Option<String>,
}

impl AgentProfile {
    pub fn validate(props: &HashMap<String, String>) -> Vec<FieldError> {
        let mut errors = Vec::new();

        match props.get(agent_keys::AGENT_TAG).map(|v| v.trim()) {
            None | Some("") => {
                errors.push(FieldError::new(agent_keys::AGENT_TAG, "agent_tag must not be blank"));
            }
            Some(tag) if !TAG_PATTERN.is_match(tag) => {
                errors.push(FieldError::new(
                    agent_keys::AGENT_TAG,
                    "agent_tag must be lowercase letters only",
                ));
            }
            Some(_) => {}
        }

        if let Err(e) = parse_bounded_f64(props, agent_keys::CPU, 0.1, 32.0) {
            errors.push(e);
        }
        if let Err(e) = parse_bounded_u64(props, agent_keys::RAM, 256, 262_144) {
            errors.push(e);
        }
        if let Err(e) = parse_bounded_u64(props, agent_keys::DISK, 256, 1_048_576) {
            errors.push(e);
        }

        errors
    }

    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ProfileError> {
        let errors = Self::validate(props);
        if !errors.is_empty() {
            return Err(ProfileError::Invalid(errors));
        }
        Ok(Self {
            tag: props
                .get(agent_keys::AGENT_TAG)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            environments: props
                .get(agent_keys::ENVIRONMENTS)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            // Validation already ran; re-parse cannot fail here.
            cpu: parse_bounded_f64(props, agent_keys::CPU, 0.1, 32.0).unwrap_or_default(),
            ram_mb: parse_bounded_u64(props, agent_keys::RAM, 256, 262_144).unwrap_or_default(),
            disk_mb: parse_bounded_u64(props, agent_keys::DISK, 256, 1_048_576)
                .unwrap_or_default(),
            init_script: props
                .get(agent_keys::INIT_SCRIPT)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from),
        })
    }

    /// Requested resources with launch-time defaults filled in.
    pub fn resources(&self) -> Resources {
        Resources {
            cpu: self.cpu.unwrap_or(Resources::DEFAULT.cpu),
            ram_mb: self.ram_mb.unwrap_or(Resources::DEFAULT.ram_mb),
            disk_mb: self.disk_mb.unwrap_or(Resources::DEFAULT.disk_mb),
        }
    }
}

fn parse_bounded_f64(
    props: &HashMap<String, String>,
    key: &str,
    min: f64,
    max: f64,
) -> Result<Option<f64>, FieldError> {
    let Some(raw) = props.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| FieldError::new(key, format!("{key} must be a number")))?;
    if !(min..=max).contains(&value) {
        return Err(FieldError::new(key, format!("{key} must be between {min} and {max}")));
    }
    Ok(Some(value))
}

fn parse_bounded_u64(
    props: &HashMap<String, String>,
    key: &str,
    min: u64,
    max: u64,
) -> Result<Option<u64>, FieldError> {
    let Some(raw) = props.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let value: u64 = raw
        .parse()
        .map_err(|_| FieldError::new(key, format!("{key} must be a whole number of MiB")))?;
    if !(min..=max).contains(&value) {
        return Err(FieldError::new(key, format!("{key} must be between {min} and {max} MiB")));
    }
    Ok(Some(value))
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
