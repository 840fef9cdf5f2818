// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status-report HTML views
//!
//! Hand-rolled fragments for the three status reports. The CI server
//! renders these inside its own chrome, so they stay plain: headings,
//! tables, no scripts.

use crate::store::{ClusterEntry, Scheduler};
use roster_adapters::ServerInfo;
use roster_core::{AgentRecord, TaskHistory};

/// Minimal HTML escaping for text nodes and attribute values.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `12s ago`, `4m ago`, `2h ago`
fn age(now_ms: u64, at_ms: u64) -> String {
    let elapsed_s = now_ms.saturating_sub(at_ms) / 1000;
    if elapsed_s < 60 {
        format!("{elapsed_s}s ago")
    } else if elapsed_s < 3600 {
        format!("{}m ago", elapsed_s / 60)
    } else {
        format!("{}h ago", elapsed_s / 3600)
    }
}

/// `agent-status-report`
pub fn agent_report(
    agent_id: &str,
    record: Option<&AgentRecord>,
    history: Option<&TaskHistory>,
    now_ms: u64,
) -> String {
    let Some(record) = record else {
        return format!("<div><h3>Agent {}</h3><p>No record for this agent.</p></div>", escape(agent_id));
    };

    let mut html = String::new();
    html.push_str(&format!(
        "<div><h3>Agent {}</h3><p>State: <strong>{}</strong> &middot; {} &middot; idle: {}</p>",
        escape(agent_id),
        record.state,
        record.resources,
        record.idle,
    ));

    html.push_str("<h4>Events</h4><table><tr><th>When</th><th>State</th><th>Message</th></tr>");
    for event in record.events.iter().rev() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            age(now_ms, event.at_ms),
            event.state,
            escape(&event.message),
        ));
    }
    html.push_str("</table>");

    if let Some(history) = history {
        html.push_str(&format!(
            "<h4>Executor task ({})</h4><table><tr><th>When</th><th>Status</th><th>Message</th></tr>",
            escape(&history.status)
        ));
        for event in history.events.iter().rev() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                age(now_ms, event.at_ms),
                escape(&event.status),
                escape(&event.message),
            ));
        }
        html.push_str("</table>");
    }

    html.push_str("</div>");
    html
}

/// `cluster-status-report`
pub fn cluster_report(
    cluster_name: &str,
    entry: Option<&ClusterEntry>,
    agents: &[&AgentRecord],
    now_ms: u64,
) -> String {
    let mut html = format!("<div><h3>Cluster {}</h3>", escape(cluster_name));

    match entry {
        Some(entry) => {
            html.push_str(&format!(
                "<p>Executor: {} &middot; role {} &middot; env {}</p>",
                escape(&entry.executor_url),
                escape(&entry.role),
                escape(&entry.env),
            ));
            match &entry.quota {
                Some(quota) => html.push_str(&format!(
                    "<p>Quota: {} used of {}</p>",
                    quota.usage, quota.available
                )),
                None => html.push_str("<p>Quota: not probed yet</p>"),
            }
        }
        None => html.push_str("<p>Cluster is not registered with the scheduler.</p>"),
    }

    html.push_str(&agent_table(agents, now_ms));
    html.push_str("</div>");
    html
}

/// `plugin-status-report`
pub fn plugin_report(server: Option<&ServerInfo>, scheduler: &Scheduler, now_ms: u64) -> String {
    let mut html = String::from("<div><h3>Elastic agent scheduler</h3>");
    if let Some(server) = server {
        html.push_str(&format!(
            "<p>CI server {} at {}</p>",
            escape(&server.server_id),
            escape(&server.site_url)
        ));
    }
    html.push_str(&format!(
        "<p>{} cluster(s), {} agent record(s)</p>",
        scheduler.clusters.len(),
        scheduler.agents.len()
    ));

    let mut names: Vec<&String> = scheduler.clusters.keys().collect();
    names.sort();
    for name in names {
        let agents: Vec<&AgentRecord> = scheduler
            .agents
            .values()
            .filter(|r| r.agent_id.as_str().starts_with(&format!("{name}/")))
            .collect();
        html.push_str(&format!("<h4>{}</h4>", escape(name)));
        html.push_str(&agent_table(&agents, now_ms));
    }
    html.push_str("</div>");
    html
}

fn agent_table(agents: &[&AgentRecord], now_ms: u64) -> String {
    if agents.is_empty() {
        return "<p>No agents.</p>".to_string();
    }
    let mut html = String::from(
        "<table><tr><th>Agent</th><th>State</th><th>Resources</th><th>Last event</th></tr>",
    );
    let mut sorted: Vec<&&AgentRecord> = agents.iter().collect();
    sorted.sort_by_key(|r| r.agent_id.as_str());
    for record in sorted {
        let last = record
            .last_event()
            .map(|e| format!("{} ({})", escape(&e.message), age(now_ms, e.at_ms)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(record.agent_id.as_str()),
            record.state,
            record.resources,
            last,
        ));
    }
    html.push_str("</table>");
    html
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
