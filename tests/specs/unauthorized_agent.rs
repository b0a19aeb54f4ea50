// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unauthorized agents never see queued work.

use super::helpers::{agent_a, stack};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn fresh_agent_polls_empty() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;

    let (status, value) = stack.poll_jobs(a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["jobs"], json!([]));
}

#[tokio::test]
async fn revoked_agent_polls_empty_despite_queued_work() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    let scan_id = stack.create_scan(&[a]).await;

    // revoke before the agent ever polls
    stack.deauthorize(a).await;

    let (status, value) = stack.poll_jobs(a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["jobs"], json!([]));

    // the work is hidden, not lost: the scan still reports a queued agent
    let status = stack.scan_status(&scan_id).await;
    assert_eq!(status["agents_queued"], 1);
}
