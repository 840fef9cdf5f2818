// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-agent lifecycle state machine
//!
//! [`manage`] joins the scheduler's record with what the executor and the CI
//! server currently report, and decides on at most one record change and at
//! most one effect. Transitions that dispatch an effect land in a state
//! whose handler is a no-op until the effect's follow-up arrives or a retry
//! timeout fires, so at most one effect per agent is ever in flight.

use crate::effect::Effect;
use crate::id::AgentId;
use crate::observe::{AgentHealth, CiAgentInfo, ConfigState, ExecutorJobSummary};
use crate::record::{AgentRecord, AgentState};
use std::time::Duration;

/// No executor or CI activity for this long fails or kills a launch.
pub const LAUNCH_TIMEOUT: Duration = Duration::from_secs(600);
/// Teardown effects are re-emitted after this much silence.
pub const TEARDOWN_RETRY: Duration = Duration::from_secs(120);
/// Adopted records (legacy, orphan) retry on a tighter clock.
pub const ADOPT_RETRY: Duration = Duration::from_secs(60);
/// An idle running agent is retired after this long without work.
pub const IDLE_RETIREMENT: Duration = Duration::from_secs(300);
/// Failed records are forgotten after this TTL.
pub const FAILED_TTL: Duration = Duration::from_secs(600);
/// Terminated records are forgotten after this TTL.
pub const TERMINATED_TTL: Duration = Duration::from_secs(300);

/// What the two external systems currently report for one agent id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation<'a> {
    pub job: Option<&'a ExecutorJobSummary>,
    pub ci: Option<&'a CiAgentInfo>,
}

/// Record change decided by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    /// No change
    Unchanged,
    /// Write this record back (insert or replace)
    Put(AgentRecord),
    /// Remove the record from the store
    Remove,
}

/// One step's decision: a record change and at most one effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub next: Next,
    pub effect: Option<Effect>,
}

impl Outcome {
    fn unchanged() -> Self {
        Self { next: Next::Unchanged, effect: None }
    }

    fn remove() -> Self {
        Self { next: Next::Remove, effect: None }
    }
}

/// Run one state-machine step for `id`.
///
/// Pure: reads the record and observation, never touches the store.
pub fn manage(
    id: &AgentId,
    record: Option<&AgentRecord>,
    obs: Observation<'_>,
    now_ms: u64,
) -> Outcome {
    match record {
        None => adopt(id, obs, now_ms),
        Some(record) => step(record.clone(), obs, now_ms),
    }
}

/// Handle an id we have no record for: a pre-existing CI registration gets
/// adopted and drained; a live executor job with no registration gets killed.
fn adopt(id: &AgentId, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if obs.ci.is_some() {
        let record =
            AgentRecord::adopt(id.clone(), AgentState::Legacy, now_ms, "unmanaged registration");
        let effect = Effect::disable_agent(id.clone());
        return Outcome { next: Next::Put(record), effect: Some(effect) };
    }
    if obs.job.is_some_and(ExecutorJobSummary::alive) {
        let record =
            AgentRecord::adopt(id.clone(), AgentState::Orphan, now_ms, "unmanaged executor job");
        let effect = Effect::kill_job(id.clone(), "executor job has no agent record");
        return Outcome { next: Next::Put(record), effect: Some(effect) };
    }
    Outcome::unchanged()
}

fn step(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    match record.state {
        AgentState::Launching => launching(record, obs, now_ms),
        AgentState::Pending => pending(record, obs, now_ms),
        AgentState::Starting => starting(record, obs, now_ms),
        AgentState::Running => running(record, obs, now_ms),
        AgentState::Retiring => retiring(record, obs, now_ms),
        AgentState::Draining => draining(record, obs, now_ms),
        AgentState::Killing => killing(record, obs, now_ms),
        AgentState::Killed => killed(record, obs, now_ms),
        AgentState::Removing => removing(record, obs, now_ms),
        AgentState::Legacy => legacy(record, now_ms),
        AgentState::Orphan => orphan(record, now_ms),
        AgentState::Failed => reap(record, FAILED_TTL, now_ms),
        AgentState::Terminated => reap(record, TERMINATED_TTL, now_ms),
    }
}

fn launching(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if obs.job.is_some_and(ExecutorJobSummary::is_active) {
        return stay(record, AgentState::Starting, "executor task active", now_ms);
    }
    if obs.job.is_some_and(ExecutorJobSummary::is_pending) {
        return stay(record, AgentState::Pending, "executor task pending", now_ms);
    }
    if record.stale(now_ms, LAUNCH_TIMEOUT) {
        return stay(record, AgentState::Failed, "no activity for 10 min", now_ms);
    }
    Outcome::unchanged()
}

fn pending(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if obs.job.is_some_and(ExecutorJobSummary::is_active) {
        return stay(record, AgentState::Starting, "executor task active", now_ms);
    }
    if registered(obs.ci) {
        return stay(record, AgentState::Running, "agent registered", now_ms);
    }
    if record.stale(now_ms, LAUNCH_TIMEOUT) {
        return kill(record, AgentState::Killing, "no task activity for 10 min", now_ms);
    }
    Outcome::unchanged()
}

fn starting(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if registered(obs.ci) {
        return stay(record, AgentState::Running, "agent registered", now_ms);
    }
    if record.stale(now_ms, LAUNCH_TIMEOUT) {
        return kill(record, AgentState::Killing, "agent never registered", now_ms);
    }
    Outcome::unchanged()
}

fn running(mut record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    match health(obs.ci) {
        AgentHealth::Disabled => {
            stay(record, AgentState::Draining, "externally disabled", now_ms)
        }
        AgentHealth::Missing | AgentHealth::LostContact => {
            kill(record, AgentState::Killing, "lost contact with agent", now_ms)
        }
        AgentHealth::Idle if record.idle_for(now_ms, IDLE_RETIREMENT) => {
            drain(record, AgentState::Retiring, "idle for 5 min", now_ms)
        }
        AgentHealth::Idle => {
            record.mark_idle();
            Outcome { next: Next::Put(record), effect: None }
        }
        AgentHealth::Building => {
            record.mark_active(now_ms);
            Outcome { next: Next::Put(record), effect: None }
        }
    }
}

fn retiring(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if config_disabled(obs.ci) {
        return stay(record, AgentState::Draining, "registration disabled", now_ms);
    }
    if record.stale(now_ms, TEARDOWN_RETRY) {
        return drain(record, AgentState::Retiring, "retrying disable", now_ms);
    }
    Outcome::unchanged()
}

fn draining(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    match health(obs.ci) {
        AgentHealth::Idle | AgentHealth::Missing | AgentHealth::LostContact => {
            kill(record, AgentState::Killing, "drained", now_ms)
        }
        _ => Outcome::unchanged(),
    }
}

fn killing(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if !obs.job.is_some_and(ExecutorJobSummary::alive) {
        return stay(record, AgentState::Killed, "executor job dead", now_ms);
    }
    if record.stale(now_ms, TEARDOWN_RETRY) {
        return kill(record, AgentState::Killing, "retrying kill", now_ms);
    }
    Outcome::unchanged()
}

fn killed(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if !obs.job.is_some_and(ExecutorJobSummary::alive) {
        return terminate(record, AgentState::Removing, "removing registration", now_ms);
    }
    Outcome::unchanged()
}

fn removing(record: AgentRecord, obs: Observation<'_>, now_ms: u64) -> Outcome {
    if !registered(obs.ci) {
        return stay(record, AgentState::Terminated, "registration gone", now_ms);
    }
    if record.stale(now_ms, TEARDOWN_RETRY) {
        return terminate(record, AgentState::Removing, "retrying delete", now_ms);
    }
    Outcome::unchanged()
}

fn legacy(record: AgentRecord, now_ms: u64) -> Outcome {
    if record.stale(now_ms, ADOPT_RETRY) {
        return drain(record, AgentState::Legacy, "retrying disable", now_ms);
    }
    Outcome::unchanged()
}

fn orphan(record: AgentRecord, now_ms: u64) -> Outcome {
    if record.stale(now_ms, ADOPT_RETRY) {
        return kill(record, AgentState::Orphan, "retrying kill", now_ms);
    }
    Outcome::unchanged()
}

/// Terminal records only age out.
fn reap(record: AgentRecord, ttl: Duration, now_ms: u64) -> Outcome {
    if record.stale(now_ms, ttl) {
        return Outcome::remove();
    }
    Outcome::unchanged()
}

// -- transition constructors --

/// Advance the record only.
fn stay(mut record: AgentRecord, state: AgentState, message: &str, now_ms: u64) -> Outcome {
    record.update(state, message, now_ms);
    Outcome { next: Next::Put(record), effect: None }
}

/// Advance and ask the CI server to disable the agent.
fn drain(mut record: AgentRecord, state: AgentState, message: &str, now_ms: u64) -> Outcome {
    record.update(state, message, now_ms);
    let effect = Effect::disable_agent(record.agent_id.clone());
    Outcome { next: Next::Put(record), effect: Some(effect) }
}

/// Advance and ask the executor to kill the agent's job.
fn kill(mut record: AgentRecord, state: AgentState, message: &str, now_ms: u64) -> Outcome {
    record.update(state, message, now_ms);
    let effect = Effect::kill_job(record.agent_id.clone(), message);
    Outcome { next: Next::Put(record), effect: Some(effect) }
}

/// Advance and ask the CI server to delete the registration.
fn terminate(mut record: AgentRecord, state: AgentState, message: &str, now_ms: u64) -> Outcome {
    record.update(state, message, now_ms);
    let effect = Effect::delete_agent(record.agent_id.clone());
    Outcome { next: Next::Put(record), effect: Some(effect) }
}

// -- observation helpers --

fn registered(ci: Option<&CiAgentInfo>) -> bool {
    ci.is_some_and(CiAgentInfo::registered)
}

/// An id absent from the CI listing reads as Missing.
fn health(ci: Option<&CiAgentInfo>) -> AgentHealth {
    ci.map_or(AgentHealth::Missing, |c| c.agent_state)
}

/// A registration we cannot see is as good as disabled.
fn config_disabled(ci: Option<&CiAgentInfo>) -> bool {
    ci.map_or(true, |c| c.config_state == ConfigState::Disabled)
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
