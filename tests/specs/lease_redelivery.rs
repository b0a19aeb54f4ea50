// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Visibility lease expiry puts the same job back on the wire.

use super::helpers::{agent_a, stack};
use axum::http::StatusCode;

#[tokio::test]
async fn silent_agent_gets_the_same_job_redelivered() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    stack.create_scan(&[a]).await;

    let (_, value) = stack.poll_jobs(a).await;
    let first = value["jobs"][0].clone();
    assert_eq!(first["attempts"], 1);

    // agent goes silent for twice the visibility timeout (2 × 600s × 2)
    stack.advance_secs(2 * 1_200 + 1);
    let reclaimed = stack.engine.reclaim_sweep().unwrap();
    assert_eq!(reclaimed, 1);

    // wait out the back-off, resume heartbeating, poll again
    stack.advance_secs(60);
    stack.heartbeat(a).await;
    let (status, value) = stack.poll_jobs(a).await;
    assert_eq!(status, StatusCode::OK);
    let second = &value["jobs"][0];

    assert_eq!(second["job_id"], first["job_id"]);
    assert_eq!(second["attempts"], 2);
}

#[tokio::test]
async fn work_done_on_a_lost_lease_is_not_lost() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    let scan_id = stack.create_scan(&[a]).await;

    let (_, value) = stack.poll_jobs(a).await;
    let job_id = value["jobs"][0]["job_id"].as_str().unwrap().to_string();
    stack.submit_result(a, &job_id, 1).await;

    // lease lapses mid-run; the job requeues
    stack.advance_secs(3_000);
    stack.engine.reclaim_sweep().unwrap();

    stack.advance_secs(60);
    stack.heartbeat(a).await;
    stack.poll_jobs(a).await;

    // the agent re-sends its first batch: deduplicated, not duplicated
    let (status, _) = stack.submit_result(a, &job_id, 1).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(stack.scan_results(&scan_id).await["total"], 1);
}
