// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn success_and_empty_are_200() {
    assert_eq!(PluginResponse::success("true"), PluginResponse { code: 200, body: "true".into() });
    assert_eq!(PluginResponse::empty().body, "");
}

#[test]
fn json_serializes_the_body() {
    let response = PluginResponse::json(&Capabilities::default());
    assert_eq!(response.code, 200);
    let parsed: Capabilities = serde_json::from_str(&response.body).unwrap();
    assert_eq!(parsed, Capabilities::default());
}

#[test]
fn errors_carry_a_message_body() {
    let response = PluginResponse::error("boom");
    assert_eq!(response.code, 500);
    assert!(response.body.contains("boom"));

    let response = PluginResponse::bad_request("missing field");
    assert_eq!(response.code, 400);
}

#[test]
fn capabilities_default_supports_all_reports() {
    let caps = Capabilities::default();
    assert!(caps.supports_plugin_status_report);
    assert!(caps.supports_cluster_status_report);
    assert!(caps.supports_agent_status_report);
}
