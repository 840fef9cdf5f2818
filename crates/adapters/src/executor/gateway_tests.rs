// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::ResponseCode;
use crate::fake::{FakeConnector, FakeExecutor};
use roster_core::Resources;

fn summary(id: &str) -> ExecutorJobSummary {
    ExecutorJobSummary {
        agent_id: AgentId::new(id),
        pending: 0,
        active: 1,
        failed: 0,
        finished: 0,
    }
}

#[tokio::test]
async fn ensure_reuses_open_connections() {
    let executor = FakeExecutor::new();
    let gateway = ExecutorGateway::new(FakeConnector::new(executor));

    gateway.ensure("http://x/api").await.unwrap();
    gateway.ensure("http://x/api").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 1);

    gateway.ensure("http://y/api").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 2);
}

#[tokio::test]
async fn failed_call_poisons_the_connection() {
    let executor = FakeExecutor::new();
    executor.state.lock().fail_quota = true;
    let gateway = ExecutorGateway::new(FakeConnector::new(executor.clone()));

    let err = gateway.get_quota("http://x/api", "www").await.unwrap_err();
    assert_eq!(err.code, ResponseCode::Transport);
    assert_eq!(gateway.connector.connect_count(), 1);

    // Next use reconnects
    executor.state.lock().fail_quota = false;
    executor.set_quota(
        "www",
        Quota { available: Resources::new(0.0, 0, 0), usage: Resources::new(0.0, 0, 0) },
    );
    gateway.get_quota("http://x/api", "www").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 2);
}

#[tokio::test]
async fn closed_connection_is_reopened() {
    let executor = FakeExecutor::new();
    let gateway = ExecutorGateway::new(FakeConnector::new(executor.clone()));

    gateway.ensure("http://x/api").await.unwrap();
    executor.state.lock().open = false;
    gateway.ensure("http://x/api").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 2);
}

#[tokio::test]
async fn list_jobs_filters_foreign_names() {
    let executor = FakeExecutor::new();
    executor.set_jobs(vec![
        summary("aws-dev/www/prod/build-agent-0"),
        summary("aws-dev/www/prod/webserver"),
        summary("aws-dev/www/prod/deploy-agent-3"),
    ]);
    let gateway = ExecutorGateway::new(FakeConnector::new(executor));

    let jobs = gateway.list_jobs("http://x/api", "www", "prod").await.unwrap();
    let ids: Vec<&str> = jobs.iter().map(|j| j.agent_id.as_str()).collect();
    assert_eq!(ids, vec!["aws-dev/www/prod/build-agent-0", "aws-dev/www/prod/deploy-agent-3"]);
}

#[tokio::test]
async fn retain_drops_stale_urls() {
    let executor = FakeExecutor::new();
    let gateway = ExecutorGateway::new(FakeConnector::new(executor));

    gateway.ensure("http://x/api").await.unwrap();
    gateway.ensure("http://y/api").await.unwrap();
    gateway.retain(&["http://x/api"]);

    gateway.ensure("http://x/api").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 2, "x stays cached");
    gateway.ensure("http://y/api").await.unwrap();
    assert_eq!(gateway.connector.connect_count(), 3, "y was dropped");
}
