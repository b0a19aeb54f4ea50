// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Register → authorize → scan → poll → submit → finalize → report.

use super::helpers::{agent_a, stack};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn one_agent_one_finding() {
    let stack = stack();
    let a = agent_a();

    // agent announces itself; unauthorized until an admin steps in
    let (status, value) = stack.heartbeat(a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["authorized"], false);

    stack.authorize(a).await;
    let (_, value) = stack.heartbeat(a).await;
    assert_eq!(value["authorized"], true);

    // upstream fans out a scan to A
    let scan_id = stack.create_scan(&[a]).await;

    // agent pulls its job
    let (status, value) = stack.poll_jobs(a).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = value["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    let job_id = jobs[0]["job_id"].as_str().unwrap().to_string();
    assert_eq!(jobs[0]["attempts"], 1);
    assert_eq!(jobs[0]["config"]["vts"][0], "1.3.6.1.4.1.25623.1.0.10662");

    // one finding, then completion
    let (status, _) = stack.submit_result(a, &job_id, 1).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, value) = stack.complete(a, &job_id, json!({"outcome": "completed"})).await;
    assert_eq!(status, StatusCode::OK, "finalize failed: {value}");
    assert_eq!(value["state"], "completed");

    // upstream sees a finished scan with the aggregated report
    let status = stack.scan_status(&scan_id).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["agents_total"], 1);
    assert_eq!(status["agents_completed"], 1);

    let results = stack.scan_results(&scan_id).await;
    assert_eq!(results["total"], 1);
    let result = &results["results"][0];
    assert_eq!(result["agent_id"], a.as_str());
    assert_eq!(result["oid"], "1.3.6.1.4.1.25623.1.0.10662");
    assert_eq!(result["host"], "localhost");
    assert_eq!(result["port"], "22/tcp");
    assert_eq!(result["severity"], 5.0);
    assert_eq!(result["threat"], "Medium");
}

#[tokio::test]
async fn duplicate_batch_and_double_finalize_are_handled() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    let scan_id = stack.create_scan(&[a]).await;
    let (_, value) = stack.poll_jobs(a).await;
    let job_id = value["jobs"][0]["job_id"].as_str().unwrap().to_string();

    // the same batch twice persists once
    stack.submit_result(a, &job_id, 1).await;
    let (status, _) = stack.submit_result(a, &job_id, 1).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(stack.scan_results(&scan_id).await["total"], 1);

    // first finalize wins, the second conflicts with state unchanged
    let (status, _) = stack.complete(a, &job_id, json!({"outcome": "completed"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, value) = stack.complete(a, &job_id, json!({"outcome": "completed"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(value["error"]["code"], "CONFLICT");
    assert!(value["error"]["message"].as_str().unwrap().contains("already finalized"));
    assert_eq!(stack.scan_status(&scan_id).await["status"], "completed");
}
