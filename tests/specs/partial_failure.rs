// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scan with one succeeding and one failing agent still completes.

use super::helpers::{agent_a, stack};
use serde_json::json;
use vg_core::test_support::agent_uuid;

#[tokio::test]
async fn one_agent_completes_one_expires() {
    let stack = stack();
    let a = agent_a();
    let b = agent_uuid(0x22);
    stack.heartbeat(a).await;
    stack.heartbeat(b).await;
    stack.authorize(a).await;
    stack.authorize(b).await;

    let scan_id = stack.create_scan(&[a, b]).await;

    // A does its work; B never even polls
    let (_, value) = stack.poll_jobs(a).await;
    let job_id = value["jobs"][0]["job_id"].as_str().unwrap().to_string();
    stack.submit_result(a, &job_id, 1).await;
    stack.complete(a, &job_id, json!({"outcome": "completed"})).await;

    let status = stack.scan_status(&scan_id).await;
    assert_eq!(status["status"], "running");
    assert_eq!(status["progress"], 50);

    // 24h later B's unclaimed job expires
    stack.advance_secs(24 * 3600 + 1);
    stack.engine.reclaim_sweep().unwrap();

    let status = stack.scan_status(&scan_id).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["agents_total"], 2);
    assert_eq!(status["agents_completed"], 1);
    assert_eq!(status["agents_failed"], 1);

    // only A's findings are in the report
    let results = stack.scan_results(&scan_id).await;
    assert_eq!(results["total"], 1);
    assert_eq!(results["results"][0]["agent_id"], a.as_str());
}

#[tokio::test]
async fn all_agents_failing_fails_the_scan() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    let scan_id = stack.create_scan(&[a]).await;

    let (_, value) = stack.poll_jobs(a).await;
    let job_id = value["jobs"][0]["job_id"].as_str().unwrap().to_string();
    stack
        .complete(a, &job_id, json!({"outcome": "failed", "reason": "executor crashed"}))
        .await;

    let status = stack.scan_status(&scan_id).await;
    assert_eq!(status["status"], "failed");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["agents_failed"], 1);
}
