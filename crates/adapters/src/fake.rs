// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake gateways for tests
//!
//! Scripted in-memory stand-ins for the executor and the CI server.
//! Shared state lives behind `Arc<Mutex<_>>` so tests can inspect recorded
//! calls and inject failures while the scheduler holds the fakes.

use crate::ci::{CiServer, CiServerError, ServerInfo};
use crate::executor::{
    ExecutorClient, ExecutorConnector, ExecutorError, JobKey, JobSpec, ResponseCode,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use roster_core::{AgentId, CiAgentInfo, ExecutorJobSummary, Quota, TaskHistory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted world state for a fake executor.
#[derive(Default)]
pub struct FakeExecutorState {
    pub jobs: Vec<ExecutorJobSummary>,
    pub quotas: HashMap<String, Quota>,
    pub histories: HashMap<AgentId, TaskHistory>,
    pub created: Vec<JobSpec>,
    pub killed: Vec<(JobKey, String)>,
    pub open: bool,
    pub fail_create: Option<ExecutorError>,
    pub fail_list: bool,
    pub fail_quota: bool,
    pub fail_kill: bool,
}

impl FakeExecutorState {
    pub fn new() -> Self {
        Self { open: true, ..Self::default() }
    }
}

/// Handle shared between a test and the connections it hands out.
#[derive(Clone)]
pub struct FakeExecutor {
    pub state: Arc<Mutex<FakeExecutorState>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(FakeExecutorState::new())) }
    }

    /// Replace the visible job list.
    pub fn set_jobs(&self, jobs: Vec<ExecutorJobSummary>) {
        self.state.lock().jobs = jobs;
    }

    pub fn set_quota(&self, role: &str, quota: Quota) {
        self.state.lock().quotas.insert(role.to_string(), quota);
    }

    pub fn created(&self) -> Vec<JobSpec> {
        self.state.lock().created.clone()
    }

    pub fn killed(&self) -> Vec<(JobKey, String)> {
        self.state.lock().killed.clone()
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutorClient for FakeExecutor {
    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn list_jobs(
        &mut self,
        _role: &str,
        env: &str,
    ) -> Result<Vec<ExecutorJobSummary>, ExecutorError> {
        let state = self.state.lock();
        if state.fail_list {
            return Err(ExecutorError::transport("listJobs failed"));
        }
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.agent_id.as_str().split('/').nth(2) == Some(env))
            .cloned()
            .collect())
    }

    async fn get_task_history(&mut self, id: &AgentId) -> Result<TaskHistory, ExecutorError> {
        self.state
            .lock()
            .histories
            .get(id)
            .cloned()
            .ok_or_else(|| ExecutorError::new(ResponseCode::InvalidRequest, format!("no job {id}")))
    }

    async fn create_job(&mut self, spec: &JobSpec) -> Result<(), ExecutorError> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_create.clone() {
            return Err(err);
        }
        let name = &spec.key.name;
        let alive = state.jobs.iter().any(|j| {
            j.alive() && j.agent_id.as_str().split('/').nth(3) == Some(name.as_str())
        });
        if alive {
            return Err(ExecutorError::new(
                ResponseCode::Conflict,
                format!("job {} already exists", spec.key),
            ));
        }
        state.created.push(spec.clone());
        Ok(())
    }

    async fn kill_tasks(&mut self, key: &JobKey, reason: &str) -> Result<(), ExecutorError> {
        let mut state = self.state.lock();
        if state.fail_kill {
            return Err(ExecutorError::transport("killTasks failed"));
        }
        state.killed.push((key.clone(), reason.to_string()));
        Ok(())
    }

    async fn get_quota(&mut self, role: &str) -> Result<Quota, ExecutorError> {
        let state = self.state.lock();
        if state.fail_quota {
            return Err(ExecutorError::transport("getQuota failed"));
        }
        state
            .quotas
            .get(role)
            .copied()
            .ok_or_else(|| ExecutorError::new(ResponseCode::InvalidRequest, format!("no role {role}")))
    }
}

/// Connector handing out clients that share one scripted world.
pub struct FakeConnector {
    executor: FakeExecutor,
    pub connects: AtomicUsize,
    pub fail_connect: Mutex<Option<ExecutorError>>,
}

impl FakeConnector {
    pub fn new(executor: FakeExecutor) -> Self {
        Self { executor, connects: AtomicUsize::new(0), fail_connect: Mutex::new(None) }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExecutorConnector for FakeConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn ExecutorClient>, ExecutorError> {
        if let Some(err) = self.fail_connect.lock().clone() {
            return Err(err);
        }
        self.connects.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(self.executor.clone()))
    }
}

/// Scripted CI server recording disable/delete calls.
#[derive(Default)]
pub struct FakeCiServerState {
    pub agents: Vec<CiAgentInfo>,
    pub disabled: Vec<AgentId>,
    pub deleted: Vec<AgentId>,
    pub fail_list: bool,
    pub fail_disable: bool,
    pub fail_delete: bool,
}

#[derive(Clone, Default)]
pub struct FakeCiServer {
    pub state: Arc<Mutex<FakeCiServerState>>,
}

impl FakeCiServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_agents(&self, agents: Vec<CiAgentInfo>) {
        self.state.lock().agents = agents;
    }

    pub fn disabled(&self) -> Vec<AgentId> {
        self.state.lock().disabled.clone()
    }

    pub fn deleted(&self) -> Vec<AgentId> {
        self.state.lock().deleted.clone()
    }
}

#[async_trait]
impl CiServer for FakeCiServer {
    async fn get_server_info(&self) -> Result<ServerInfo, CiServerError> {
        Ok(ServerInfo { server_id: "fake-server".into(), site_url: "http://s/go".into() })
    }

    async fn list_agents(&self) -> Result<Vec<CiAgentInfo>, CiServerError> {
        let state = self.state.lock();
        if state.fail_list {
            return Err(CiServerError::Transport("listAgents failed".into()));
        }
        Ok(state.agents.clone())
    }

    async fn disable_agents(&self, ids: &[AgentId]) -> Result<(), CiServerError> {
        let mut state = self.state.lock();
        if state.fail_disable {
            return Err(CiServerError::Response { code: 500, message: "disable failed".into() });
        }
        state.disabled.extend(ids.iter().cloned());
        Ok(())
    }

    async fn delete_agents(&self, ids: &[AgentId]) -> Result<(), CiServerError> {
        let mut state = self.state.lock();
        if state.fail_delete {
            return Err(CiServerError::Response { code: 422, message: "delete failed".into() });
        }
        state.deleted.extend(ids.iter().cloned());
        Ok(())
    }
}
