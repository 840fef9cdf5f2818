// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent lifecycle record
//!
//! The record is the scheduler's own view of one agent: current state, the
//! append-only event log whose last entry drives staleness, and the idle
//! bookkeeping that drives retirement.

use crate::id::AgentId;
use crate::resources::Resources;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Most recent events kept per record; retry loops drop older entries.
const EVENT_LOG_CAP: usize = 100;

/// Lifecycle state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Executor job requested, nothing observed yet
    Launching,
    /// Executor reports the job queued
    Pending,
    /// Executor reports a task active, agent not yet registered
    Starting,
    /// Registered with the CI server and usable
    Running,
    /// Disable requested so the agent stops taking work
    Retiring,
    /// Disabled; waiting for in-flight work to finish
    Draining,
    /// Executor kill requested
    Killing,
    /// Executor job confirmed dead
    Killed,
    /// CI registration delete requested
    Removing,
    /// Fully torn down; record lingers for its TTL
    Terminated,
    /// Launch failed; record lingers for its TTL
    Failed,
    /// Pre-existing registration adopted for teardown
    Legacy,
    /// Executor job with no registration and no record
    Orphan,
}

impl AgentState {
    /// Terminal states receive no further effects; their only transition
    /// is deletion after a TTL.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Failed)
    }

    /// States in which a launch is still in flight (`launched_for` may be set).
    pub fn is_launch(&self) -> bool {
        matches!(self, Self::Launching | Self::Pending | Self::Starting)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Launching => "launching",
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Retiring => "retiring",
            Self::Draining => "draining",
            Self::Killing => "killing",
            Self::Killed => "killed",
            Self::Removing => "removing",
            Self::Terminated => "terminated",
            Self::Failed => "failed",
            Self::Legacy => "legacy",
            Self::Orphan => "orphan",
        };
        write!(f, "{name}")
    }
}

/// One entry in a record's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    pub at_ms: u64,
    pub state: AgentState,
    pub message: String,
}

/// The scheduler's mutable record for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub state: AgentState,
    pub environments: Vec<String>,
    pub resources: Resources,
    /// Last known work assignment or heartbeat, epoch ms.
    pub last_active_ms: Option<u64>,
    /// Last observed CI idleness.
    pub idle: bool,
    /// CI job id this agent was launched for; set only while launching.
    pub launched_for: Option<u64>,
    pub events: Vec<StateEvent>,
}

impl AgentRecord {
    /// Initialize a record for a newly requested agent.
    pub fn init(
        agent_id: AgentId,
        state: AgentState,
        environments: Vec<String>,
        resources: Resources,
        now_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        let mut record = Self {
            agent_id,
            state,
            environments,
            resources,
            last_active_ms: Some(now_ms),
            idle: false,
            launched_for: None,
            events: Vec::new(),
        };
        record.update(state, message, now_ms);
        record
    }

    /// Initialize a record for an agent discovered rather than launched
    /// (legacy registrations and orphaned executor jobs).
    pub fn adopt(
        agent_id: AgentId,
        state: AgentState,
        now_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::init(agent_id, state, Vec::new(), Resources::default(), now_ms, message)
    }

    /// Advance the state and append an event.
    ///
    /// Appending with the current state is how retries refresh the stale
    /// clock. `launched_for` survives only within the launch states.
    pub fn update(&mut self, state: AgentState, message: impl Into<String>, now_ms: u64) {
        self.state = state;
        if !state.is_launch() {
            self.launched_for = None;
        }
        self.events.push(StateEvent { at_ms: now_ms, state, message: message.into() });
        if self.events.len() > EVENT_LOG_CAP {
            let drop = self.events.len() - EVENT_LOG_CAP;
            self.events.drain(..drop);
        }
    }

    /// Record a work assignment or heartbeat.
    pub fn mark_active(&mut self, now_ms: u64) {
        self.last_active_ms = Some(now_ms);
        self.idle = false;
    }

    /// Record observed idleness. Leaves `last_active_ms` alone so
    /// [`idle_for`](Self::idle_for) measures from the last real activity.
    pub fn mark_idle(&mut self) {
        self.idle = true;
    }

    /// The most recent event. Records always carry at least one.
    pub fn last_event(&self) -> Option<&StateEvent> {
        self.events.last()
    }

    /// Whether nothing has been recorded for longer than `within`.
    ///
    /// Staleness is measured from the last event, not from `last_active_ms`.
    pub fn stale(&self, now_ms: u64, within: Duration) -> bool {
        let Some(last) = self.last_event() else {
            return true;
        };
        now_ms.saturating_sub(last.at_ms) > within.as_millis() as u64
    }

    /// Whether the agent has been idle for at least `period`.
    ///
    /// False when no activity was ever recorded, regardless of `period`.
    pub fn idle_for(&self, now_ms: u64, period: Duration) -> bool {
        if !self.idle {
            return false;
        }
        match self.last_active_ms {
            Some(at) => now_ms.saturating_sub(at) >= period.as_millis() as u64,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
