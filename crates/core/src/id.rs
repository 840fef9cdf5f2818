// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier codec
//!
//! Agents are identified by a four-segment path `cluster/role/env/name`,
//! where `name` follows the `tag-agent-N` convention. Identifiers coming
//! back from the executor that do not parse are not ours and get filtered
//! out by the gateways.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static AGENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+-agent-[0-9]+$").expect("constant regex pattern is valid")
});

/// Opaque agent identifier, `cluster/role/env/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Structured form of an [`AgentId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentKey {
    pub cluster: String,
    pub role: String,
    pub env: String,
    pub name: String,
}

impl AgentKey {
    /// Format the four segments into an [`AgentId`].
    pub fn form(cluster: &str, role: &str, env: &str, name: &str) -> AgentId {
        AgentId(format!("{cluster}/{role}/{env}/{name}"))
    }

    /// Parse an identifier back into its segments.
    ///
    /// Returns `None` for anything that is not a well-formed agent id:
    /// wrong segment count, empty segments, or a name outside the
    /// `tag-agent-N` convention.
    pub fn parse(id: &AgentId) -> Option<AgentKey> {
        Self::parse_str(id.as_str())
    }

    pub fn parse_str(id: &str) -> Option<AgentKey> {
        let mut parts = id.split('/');
        let cluster = parts.next()?;
        let role = parts.next()?;
        let env = parts.next()?;
        let name = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if cluster.is_empty() || role.is_empty() || env.is_empty() {
            return None;
        }
        if !AGENT_NAME.is_match(name) {
            return None;
        }
        Some(AgentKey {
            cluster: cluster.to_string(),
            role: role.to_string(),
            env: env.to_string(),
            name: name.to_string(),
        })
    }

    /// The profile tag embedded in the agent name (`build` in `build-agent-3`).
    pub fn tag(&self) -> &str {
        self.name.split("-agent-").next().unwrap_or(&self.name)
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.cluster, self.role, self.env, self.name)
    }
}

/// Compose an agent name from a profile tag and an index.
pub fn agent_name(tag: &str, index: u32) -> String {
    format!("{tag}-agent-{index}")
}

/// Whether a bare name matches the agent naming convention.
pub fn is_agent_name(name: &str) -> bool {
    AGENT_NAME.is_match(name)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
