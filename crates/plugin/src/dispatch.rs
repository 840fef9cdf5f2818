// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect dispatcher
//!
//! Runs effects on worker tasks, off the writer. Success enqueues the
//! effect's `on_success` follow-up; failure is logged and, where the effect
//! carries an `on_failure`, enqueued with the error appended. A failed
//! effect without a failure follow-up leaves the record alone — the state
//! machine's staleness edge retries on a later ping.

use crate::store::{EffectSink, Store};
use roster_adapters::{
    CiServer, CiServerError, ExecutorConnector, ExecutorError, ExecutorGateway, JobKey,
};
use roster_core::{AgentKey, Clock, Effect, EffectKind, FollowUp};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
enum EffectError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Ci(#[from] CiServerError),
    #[error("no cluster entry for agent {0}")]
    UnknownCluster(String),
    #[error("unparseable agent id {0}")]
    BadId(String),
}

/// Executes effects against the gateways and feeds follow-ups back to the
/// writer.
pub struct Dispatcher<F: ExecutorConnector, S: CiServer, C: Clock> {
    executors: Arc<ExecutorGateway<F>>,
    ci: Arc<S>,
    store: Store,
    clock: C,
}

impl<F: ExecutorConnector, S: CiServer, C: Clock> Clone for Dispatcher<F, S, C> {
    fn clone(&self) -> Self {
        Self {
            executors: Arc::clone(&self.executors),
            ci: Arc::clone(&self.ci),
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<F: ExecutorConnector, S: CiServer, C: Clock> Dispatcher<F, S, C> {
    pub fn new(
        executors: Arc<ExecutorGateway<F>>,
        ci: Arc<S>,
        store: Store,
        clock: C,
    ) -> Self {
        Self { executors, ci, store, clock }
    }

    /// Execute one effect with logging, then enqueue the follow-up.
    async fn run(self, effect: Effect) {
        let op = effect.name();
        let info: String = effect
            .fields()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!("executing effect={op} {info}");

        let start = std::time::Instant::now();
        let result = self.execute(&effect).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                tracing::info!(elapsed_ms, "completed effect={op} {info}");
                self.finish(&effect, effect.on_success.clone()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, elapsed_ms, "failed effect={op} {info}");
                if let Some(on_failure) = &effect.on_failure {
                    let follow_up = FollowUp::new(
                        on_failure.state,
                        format!("{}: {}", on_failure.message, e),
                    );
                    self.finish(&effect, follow_up).await;
                }
            }
        }
    }

    async fn finish(&self, effect: &Effect, follow_up: FollowUp) {
        let now_ms = self.clock.epoch_ms();
        if self
            .store
            .follow_up(effect.agent_id.clone(), follow_up, now_ms)
            .await
            .is_err()
        {
            tracing::debug!(agent = %effect.agent_id, "writer gone, follow-up dropped");
        }
    }

    async fn execute(&self, effect: &Effect) -> Result<(), EffectError> {
        match &effect.kind {
            EffectKind::CreateJob(spec) => {
                let job_spec = crate::bootstrap::job_spec(&effect.agent_id, spec);
                self.executors.create_job(&spec.cluster.executor_url, &job_spec).await?;
                Ok(())
            }
            EffectKind::KillJob { reason } => {
                let key = AgentKey::parse(&effect.agent_id)
                    .ok_or_else(|| EffectError::BadId(effect.agent_id.to_string()))?;
                let url = self
                    .store
                    .snapshot()
                    .clusters
                    .get(&key.cluster)
                    .map(|c| c.executor_url.clone())
                    .ok_or_else(|| EffectError::UnknownCluster(effect.agent_id.to_string()))?;
                let job_key = JobKey { role: key.role, env: key.env, name: key.name };
                self.executors.kill_tasks(&url, &job_key, reason).await?;
                Ok(())
            }
            EffectKind::DisableAgent => {
                self.ci.disable_agents(std::slice::from_ref(&effect.agent_id)).await?;
                Ok(())
            }
            EffectKind::DeleteAgent => {
                self.ci.delete_agents(std::slice::from_ref(&effect.agent_id)).await?;
                Ok(())
            }
        }
    }
}

impl<F: ExecutorConnector, S: CiServer, C: Clock> EffectSink for Dispatcher<F, S, C> {
    fn dispatch(&self, effect: Effect) {
        let worker = self.clone();
        tokio::spawn(async move {
            worker.run(effect).await;
        });
    }
}
