// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profile field metadata
//!
//! One declarative table per profile type drives both the
//! `get-*-profile-metadata` responses and `migrate-config` normalization.

use roster_core::profile::{agent_keys, cluster_keys};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub required: bool,
    pub secure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileField {
    pub key: String,
    pub metadata: FieldRules,
}

impl ProfileField {
    fn new(key: &str, required: bool) -> Self {
        Self { key: key.to_string(), metadata: FieldRules { required, secure: false } }
    }
}

pub fn cluster_profile_metadata() -> Vec<ProfileField> {
    vec![
        ProfileField::new(cluster_keys::EXECUTOR_URL, true),
        ProfileField::new(cluster_keys::CLUSTER_NAME, true),
        ProfileField::new(cluster_keys::CLUSTER_ROLE, true),
        ProfileField::new(cluster_keys::CLUSTER_ENV, true),
        ProfileField::new(cluster_keys::SERVER_API_URL, true),
        ProfileField::new(cluster_keys::AGENT_SOURCE_URL, false),
    ]
}

pub fn elastic_agent_profile_metadata() -> Vec<ProfileField> {
    vec![
        ProfileField::new(agent_keys::AGENT_TAG, true),
        ProfileField::new(agent_keys::ENVIRONMENTS, false),
        ProfileField::new(agent_keys::CPU, false),
        ProfileField::new(agent_keys::RAM, false),
        ProfileField::new(agent_keys::DISK, false),
        ProfileField::new(agent_keys::INIT_SCRIPT, false),
    ]
}

/// Keep known keys with non-blank values, drop everything else.
pub fn normalize_properties(
    props: &HashMap<String, String>,
    fields: &[ProfileField],
) -> HashMap<String, String> {
    props
        .iter()
        .filter(|(key, value)| {
            fields.iter().any(|f| f.key == **key) && !value.trim().is_empty()
        })
        .map(|(key, value)| (key.clone(), value.trim().to_string()))
        .collect()
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
