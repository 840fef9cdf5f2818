// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached, serialized access to executor connections
//!
//! One connection per executor URL. Each connection carries its own async
//! lock (client instances are not thread-safe) and a dirty flag: any failed
//! call poisons the connection, and the next use reconnects.

use super::{ExecutorClient, ExecutorConnector, ExecutorError, JobKey, JobSpec};
use parking_lot::Mutex;
use roster_core::{AgentId, AgentKey, ExecutorJobSummary, Quota, TaskHistory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One cached connection with its exclusive-use lock.
pub struct Connection {
    client: tokio::sync::Mutex<Box<dyn ExecutorClient>>,
    dirty: AtomicBool,
}

impl Connection {
    fn new(client: Box<dyn ExecutorClient>) -> Self {
        Self { client: tokio::sync::Mutex::new(client), dirty: AtomicBool::new(false) }
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }
}

/// Connection cache keyed by executor URL, with typed call wrappers.
pub struct ExecutorGateway<F: ExecutorConnector> {
    connector: F,
    conns: Mutex<HashMap<String, Arc<Connection>>>,
}

impl<F: ExecutorConnector> ExecutorGateway<F> {
    pub fn new(connector: F) -> Self {
        Self { connector, conns: Mutex::new(HashMap::new()) }
    }

    /// Return the cached connection for `url`, reconnecting when absent,
    /// closed, or poisoned by an earlier failure.
    pub async fn ensure(&self, url: &str) -> Result<Arc<Connection>, ExecutorError> {
        let cached = self.conns.lock().get(url).cloned();
        if let Some(conn) = cached {
            if !conn.is_dirty() && conn.client.lock().await.is_open() {
                return Ok(conn);
            }
            self.close(url);
        }
        let client = self.connector.connect(url).await?;
        let conn = Arc::new(Connection::new(client));
        self.conns.lock().insert(url.to_string(), conn.clone());
        Ok(conn)
    }

    /// Drop the cached connection for `url`.
    pub fn close(&self, url: &str) {
        self.conns.lock().remove(url);
    }

    /// Drop cached connections for every URL not in `keep`.
    pub fn retain(&self, keep: &[&str]) {
        self.conns.lock().retain(|url, _| keep.contains(&url.as_str()));
    }

    pub async fn list_jobs(
        &self,
        url: &str,
        role: &str,
        env: &str,
    ) -> Result<Vec<ExecutorJobSummary>, ExecutorError> {
        let conn = self.ensure(url).await?;
        let mut client = conn.client.lock().await;
        let result = client.list_jobs(role, env).await;
        drop(client);
        poison_on_err(&conn, &result);
        // Jobs whose names don't parse are not ours
        result.map(|jobs| {
            jobs.into_iter().filter(|j| AgentKey::parse(&j.agent_id).is_some()).collect()
        })
    }

    pub async fn get_task_history(
        &self,
        url: &str,
        id: &AgentId,
    ) -> Result<TaskHistory, ExecutorError> {
        let conn = self.ensure(url).await?;
        let mut client = conn.client.lock().await;
        let result = client.get_task_history(id).await;
        drop(client);
        poison_on_err(&conn, &result);
        result
    }

    pub async fn create_job(&self, url: &str, spec: &JobSpec) -> Result<(), ExecutorError> {
        let conn = self.ensure(url).await?;
        let mut client = conn.client.lock().await;
        let result = client.create_job(spec).await;
        drop(client);
        poison_on_err(&conn, &result);
        result
    }

    pub async fn kill_tasks(
        &self,
        url: &str,
        key: &JobKey,
        reason: &str,
    ) -> Result<(), ExecutorError> {
        let conn = self.ensure(url).await?;
        let mut client = conn.client.lock().await;
        let result = client.kill_tasks(key, reason).await;
        drop(client);
        poison_on_err(&conn, &result);
        result
    }

    pub async fn get_quota(&self, url: &str, role: &str) -> Result<Quota, ExecutorError> {
        let conn = self.ensure(url).await?;
        let mut client = conn.client.lock().await;
        let result = client.get_quota(role).await;
        drop(client);
        poison_on_err(&conn, &result);
        result
    }
}

fn poison_on_err<T>(conn: &Connection, result: &Result<T, ExecutorError>) {
    if result.is_err() {
        conn.mark_dirty();
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
