// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn job(pending: u32, active: u32) -> ExecutorJobSummary {
    ExecutorJobSummary {
        agent_id: AgentId::new("c/r/e/build-agent-0"),
        pending,
        active,
        failed: 0,
        finished: 0,
    }
}

#[test]
fn alive_means_pending_or_active() {
    assert!(job(1, 0).alive());
    assert!(job(0, 1).alive());
    assert!(!job(0, 0).alive());
}

#[test]
fn registered_requires_enabled_and_contact() {
    let mut info = CiAgentInfo {
        agent_id: AgentId::new("c/r/e/build-agent-0"),
        config_state: ConfigState::Enabled,
        agent_state: AgentHealth::Idle,
    };
    assert!(info.registered());

    info.agent_state = AgentHealth::Building;
    assert!(info.registered());

    info.agent_state = AgentHealth::Missing;
    assert!(!info.registered());

    info.agent_state = AgentHealth::LostContact;
    assert!(!info.registered());

    info.agent_state = AgentHealth::Idle;
    info.config_state = ConfigState::Disabled;
    assert!(!info.registered());
}

#[test]
fn ci_agent_states_use_server_spelling() {
    let parsed: AgentHealth = serde_json::from_str("\"LostContact\"").unwrap();
    assert_eq!(parsed, AgentHealth::LostContact);
    let parsed: ConfigState = serde_json::from_str("\"Enabled\"").unwrap();
    assert_eq!(parsed, ConfigState::Enabled);
}
