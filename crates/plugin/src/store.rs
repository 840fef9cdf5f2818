// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-writer scheduler store
//!
//! One writer task owns every mutation of the [`Scheduler`] value. Callers
//! submit [`Transition`] closures over a bounded queue; each closure is a
//! pure function of the current value that may return effects, which the
//! writer hands to the effect sink after committing. Readers take lock-free
//! snapshots of an atomically republished `Arc`.

use parking_lot::RwLock;
use roster_core::{AgentId, AgentKey, AgentRecord, Effect, FollowUp, Next, Outcome, Quota};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Bound on queued transitions; submitters back off when the writer lags.
const QUEUE_DEPTH: usize = 256;

/// Mutable per-cluster state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEntry {
    pub executor_url: String,
    pub role: String,
    pub env: String,
    pub quota: Option<Quota>,
}

/// The scheduler value: every cluster entry and agent record.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pub clusters: HashMap<String, ClusterEntry>,
    pub agents: HashMap<AgentId, AgentRecord>,
}

/// A state transition: reads the current value, mutates it, and returns
/// the effects to dispatch. Effects are data, never closures.
pub type Transition = Box<dyn FnOnce(&mut Scheduler) -> Vec<Effect> + Send>;

/// Where the writer hands committed effects.
pub trait EffectSink: Send + Sync + 'static {
    fn dispatch(&self, effect: Effect);
}

/// The writer queue has shut down.
#[derive(Debug, Error)]
#[error("scheduler writer is gone")]
pub struct StoreClosed;

/// Handle to the single-writer store.
#[derive(Clone)]
pub struct Store {
    tx: mpsc::Sender<Transition>,
    cell: Arc<RwLock<Arc<Scheduler>>>,
}

impl Store {
    /// Create the store handle and the writer's receive side.
    pub fn new() -> (Store, mpsc::Receiver<Transition>) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let cell = Arc::new(RwLock::new(Arc::new(Scheduler::default())));
        (Self { tx, cell }, rx)
    }

    /// A consistent snapshot of the current value. May be immediately
    /// stale, which is fine for the read paths that use it.
    pub fn snapshot(&self) -> Arc<Scheduler> {
        self.cell.read().clone()
    }

    /// Enqueue a transition for the writer.
    pub async fn submit(&self, transition: Transition) -> Result<(), StoreClosed> {
        self.tx.send(transition).await.map_err(|_| StoreClosed)
    }

    /// Wait until every previously submitted transition has been applied.
    pub async fn barrier(&self) -> Result<(), StoreClosed> {
        let (done_tx, done_rx) = oneshot::channel();
        self.submit(Box::new(move |_| {
            let _ = done_tx.send(());
            Vec::new()
        }))
        .await?;
        done_rx.await.map_err(|_| StoreClosed)
    }

    /// Enqueue an effect follow-up: advance the agent's record to the
    /// follow-up state, logging the change.
    pub async fn follow_up(
        &self,
        id: AgentId,
        follow_up: FollowUp,
        now_ms: u64,
    ) -> Result<(), StoreClosed> {
        self.submit(Box::new(move |scheduler| {
            apply_follow_up(scheduler, &id, &follow_up, now_ms);
            Vec::new()
        }))
        .await
    }
}

/// Spawn the writer task: apply transitions in order, republish the
/// snapshot, hand effects to the sink.
pub(crate) fn spawn_writer(
    mut rx: mpsc::Receiver<Transition>,
    store: &Store,
    sink: Box<dyn EffectSink>,
) {
    let cell = store.cell.clone();
    tokio::spawn(async move {
        let mut value = Scheduler::default();
        while let Some(transition) = rx.recv().await {
            let effects = transition(&mut value);
            *cell.write() = Arc::new(value.clone());
            for effect in effects {
                sink.dispatch(effect);
            }
        }
        tracing::debug!("scheduler writer stopped");
    });
}

/// Commit one state-machine outcome, logging record changes.
pub fn apply_outcome(scheduler: &mut Scheduler, id: &AgentId, outcome: Outcome) -> Vec<Effect> {
    match outcome.next {
        Next::Unchanged => {}
        Next::Put(record) => {
            let from = scheduler.agents.get(id).map(|r| r.state);
            if from != Some(record.state) {
                let message =
                    record.last_event().map(|e| e.message.as_str()).unwrap_or_default();
                match from {
                    Some(from) => {
                        tracing::info!(agent = %id, %from, to = %record.state, message)
                    }
                    None => tracing::info!(agent = %id, to = %record.state, message),
                }
            }
            scheduler.agents.insert(id.clone(), record);
        }
        Next::Remove => {
            if let Some(record) = scheduler.agents.remove(id) {
                tracing::info!(agent = %id, state = %record.state, "forgetting record");
            }
        }
    }
    outcome.effect.into_iter().collect()
}

/// Apply an effect follow-up to a record, if it still exists.
pub fn apply_follow_up(
    scheduler: &mut Scheduler,
    id: &AgentId,
    follow_up: &FollowUp,
    now_ms: u64,
) {
    match scheduler.agents.get_mut(id) {
        Some(record) => {
            let from = record.state;
            record.update(follow_up.state, &follow_up.message, now_ms);
            if from != follow_up.state {
                tracing::info!(
                    agent = %id,
                    %from,
                    to = %follow_up.state,
                    message = follow_up.message,
                );
            }
        }
        None => {
            tracing::debug!(agent = %id, "follow-up for unknown agent dropped");
        }
    }
}

impl Scheduler {
    /// Cluster entry owning an agent id, via the id's cluster segment.
    pub fn cluster_of(&self, id: &AgentId) -> Option<&ClusterEntry> {
        let key = AgentKey::parse(id)?;
        self.clusters.get(&key.cluster)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
