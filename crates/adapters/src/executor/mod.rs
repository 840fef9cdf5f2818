// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor client abstraction
//!
//! Five typed calls against the upstream cluster scheduler. Every non-OK
//! response surfaces as an [`ExecutorError`]; callers never inspect
//! response codes. A client instance is NOT safe for concurrent use —
//! [`ExecutorGateway`](gateway::ExecutorGateway) serializes access per
//! connection.

mod gateway;

pub use gateway::ExecutorGateway;

use async_trait::async_trait;
use roster_core::{AgentId, ExecutorJobSummary, Quota, Resources, TaskHistory};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Response code attached to a failed executor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    InvalidRequest,
    AuthFailed,
    /// A live job already exists under the same (role, env, name)
    Conflict,
    /// Transient server-side failure, safe to retry
    Transient,
    /// Connection-level failure
    Transport,
    Error,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::AuthFailed => "AUTH_FAILED",
            Self::Conflict => "CONFLICT",
            Self::Transient => "TRANSIENT",
            Self::Transport => "TRANSPORT",
            Self::Error => "ERROR",
        };
        write!(f, "{name}")
    }
}

/// Typed failure from any executor operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {}", messages.join("; "))]
pub struct ExecutorError {
    pub code: ResponseCode,
    pub messages: Vec<String>,
}

impl ExecutorError {
    pub fn new(code: ResponseCode, message: impl Into<String>) -> Self {
        Self { code, messages: vec![message.into()] }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ResponseCode::Transport, message)
    }
}

/// Identifies one job in the executor: `role/env/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub role: String,
    pub env: String,
    pub name: String,
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.role, self.env, self.name)
    }
}

/// One bootstrap process inside an agent's task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub cmdline: String,
    pub max_failures: u32,
    pub ephemeral: bool,
    pub min_duration: u32,
    pub daemon: bool,
    #[serde(rename = "final")]
    pub final_: bool,
}

impl ProcessSpec {
    /// Bootstrap processes share the same limits; only name and command vary.
    pub fn new(name: &str, cmdline: String) -> Self {
        Self {
            name: name.to_string(),
            cmdline,
            max_failures: 1,
            ephemeral: false,
            min_duration: 5,
            daemon: false,
            final_: false,
        }
    }
}

/// Process ordering constraint within a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraint {
    pub order: Vec<String>,
}

/// The task an agent job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub finalization_wait: u32,
    pub max_failures: u32,
    pub max_concurrency: u32,
    pub processes: Vec<ProcessSpec>,
    pub constraints: Vec<OrderConstraint>,
}

/// Everything the executor needs to run one agent job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub key: JobKey,
    pub resources: Resources,
    pub task: TaskConfig,
}

/// A single executor connection. Not safe for concurrent use.
#[async_trait]
pub trait ExecutorClient: Send {
    /// Whether the underlying connection is still usable.
    fn is_open(&self) -> bool;

    /// Jobs under `role` in `env`. The gateway filters out jobs whose
    /// names are not ours.
    async fn list_jobs(
        &mut self,
        role: &str,
        env: &str,
    ) -> Result<Vec<ExecutorJobSummary>, ExecutorError>;

    /// Latest task descriptor for an agent's job. Fails if unknown.
    async fn get_task_history(&mut self, id: &AgentId) -> Result<TaskHistory, ExecutorError>;

    /// Create a job. Idempotent w.r.t. the key: creating while a live job
    /// exists fails with [`ResponseCode::Conflict`].
    async fn create_job(&mut self, spec: &JobSpec) -> Result<(), ExecutorError>;

    /// Request that a job's tasks be killed. Acceptance does not imply the
    /// tasks are dead yet.
    async fn kill_tasks(&mut self, key: &JobKey, reason: &str) -> Result<(), ExecutorError>;

    /// Per-role resource envelope.
    async fn get_quota(&mut self, role: &str) -> Result<Quota, ExecutorError>;
}

/// Opens executor connections for the gateway's cache.
#[async_trait]
pub trait ExecutorConnector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn ExecutorClient>, ExecutorError>;
}
