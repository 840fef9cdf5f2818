// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record(now_ms: u64) -> AgentRecord {
    AgentRecord::init(
        AgentId::new("aws-dev/www/prod/build-agent-0"),
        AgentState::Launching,
        vec!["prod".to_string()],
        Resources::new(1.0, 1024, 1024),
        now_ms,
        "job requested",
    )
}

#[test]
fn init_seeds_one_event_and_activity() {
    let r = record(1_000);
    assert_eq!(r.state, AgentState::Launching);
    assert_eq!(r.events.len(), 1);
    assert_eq!(r.last_event().unwrap().state, AgentState::Launching);
    assert_eq!(r.last_active_ms, Some(1_000));
    assert!(!r.idle);
}

#[test]
fn update_appends_and_tracks_state() {
    let mut r = record(1_000);
    r.update(AgentState::Pending, "job created", 2_000);
    assert_eq!(r.state, AgentState::Pending);
    assert_eq!(r.events.len(), 2);
    let last = r.last_event().unwrap();
    assert_eq!(last.state, AgentState::Pending);
    assert_eq!(last.at_ms, 2_000);
    assert_eq!(last.message, "job created");
}

#[test]
fn launched_for_cleared_outside_launch_states() {
    let mut r = record(1_000);
    r.launched_for = Some(100);

    r.update(AgentState::Pending, "job created", 2_000);
    assert_eq!(r.launched_for, Some(100));
    r.update(AgentState::Starting, "task active", 3_000);
    assert_eq!(r.launched_for, Some(100));
    r.update(AgentState::Running, "registered", 4_000);
    assert_eq!(r.launched_for, None);
}

#[test]
fn stale_measures_from_last_event_not_activity() {
    let mut r = record(1_000);
    // Fresh activity should not mask event-log staleness
    r.mark_active(700_000);
    assert!(r.stale(700_001, Duration::from_secs(600)));
    assert!(!r.stale(601_000, Duration::from_secs(600)));

    r.update(AgentState::Pending, "retry", 700_000);
    assert!(!r.stale(700_001, Duration::from_secs(600)));
}

#[test]
fn idle_for_requires_idle_and_elapsed_activity() {
    let mut r = record(1_000);
    assert!(!r.idle_for(1_000_000, Duration::from_secs(300)));

    r.mark_idle();
    assert!(r.idle_for(301_001, Duration::from_secs(300)));
    assert!(!r.idle_for(100_000, Duration::from_secs(300)));

    r.mark_active(500_000);
    assert!(!r.idle, "activity clears idleness");
}

#[test]
fn idle_for_is_false_without_activity() {
    let mut r = record(1_000);
    r.last_active_ms = None;
    r.mark_idle();
    assert!(!r.idle_for(u64::MAX, Duration::from_secs(0)));
}

#[test]
fn event_log_is_capped() {
    let mut r = record(0);
    for i in 0..500u64 {
        r.update(AgentState::Killing, "retrying kill", i);
    }
    assert_eq!(r.events.len(), 100);
    assert_eq!(r.last_event().unwrap().at_ms, 499);
    // Oldest surviving entry is the most recent hundred
    assert_eq!(r.events.first().unwrap().at_ms, 400);
}

#[test]
fn terminal_states() {
    assert!(AgentState::Terminated.is_terminal());
    assert!(AgentState::Failed.is_terminal());
    for s in [
        AgentState::Launching,
        AgentState::Pending,
        AgentState::Starting,
        AgentState::Running,
        AgentState::Retiring,
        AgentState::Draining,
        AgentState::Killing,
        AgentState::Killed,
        AgentState::Removing,
        AgentState::Legacy,
        AgentState::Orphan,
    ] {
        assert!(!s.is_terminal(), "{s} is not terminal");
    }
}

#[test]
fn state_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&AgentState::Launching).unwrap(), "\"launching\"");
    let parsed: AgentState = serde_json::from_str("\"killed\"").unwrap();
    assert_eq!(parsed, AgentState::Killed);
    assert!(serde_json::from_str::<AgentState>("\"lost\"").is_err());
}
