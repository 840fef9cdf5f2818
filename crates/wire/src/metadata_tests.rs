// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn cluster_metadata_marks_required_fields() {
    let fields = cluster_profile_metadata();
    let required: Vec<&str> = fields
        .iter()
        .filter(|f| f.metadata.required)
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(
        required,
        vec!["executor_url", "cluster_name", "cluster_role", "cluster_env", "server_api_url"]
    );
    assert!(fields.iter().all(|f| !f.metadata.secure));
}

#[test]
fn agent_metadata_requires_only_the_tag() {
    let fields = elastic_agent_profile_metadata();
    let required: Vec<&str> = fields
        .iter()
        .filter(|f| f.metadata.required)
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(required, vec!["agent_tag"]);
}

#[test]
fn normalize_drops_unknown_and_blank_properties() {
    let props: HashMap<String, String> = [
        ("agent_tag", "build"),
        ("cpu", " 2.0 "),
        ("ram", ""),
        ("legacy_setting", "x"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let normalized = normalize_properties(&props, &elastic_agent_profile_metadata());
    assert_eq!(normalized.get("agent_tag").map(String::as_str), Some("build"));
    assert_eq!(normalized.get("cpu").map(String::as_str), Some("2.0"));
    assert!(!normalized.contains_key("ram"));
    assert!(!normalized.contains_key("legacy_setting"));
}

#[test]
fn metadata_serializes_in_the_expected_shape() {
    let json = serde_json::to_value(cluster_profile_metadata()).unwrap();
    assert_eq!(json[0]["key"], "executor_url");
    assert_eq!(json[0]["metadata"]["required"], true);
    assert_eq!(json[0]["metadata"]["secure"], false);
}
