// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config writes propagate through the heartbeat flag and the config pull.

use super::helpers::{agent_a, stack};
use axum::http::StatusCode;
use serde_json::json;

fn config_with_interval(seconds: u64) -> serde_json::Value {
    json!({
        "config": {
            "heartbeat": { "interval_in_seconds": seconds, "miss_until_inactive": 1 },
            "retry": { "attempts": 3, "delay_in_seconds": 10, "max_jitter_in_seconds": 5 },
            "executor": { "bulk_size": 100, "bulk_throttle_time_in_ms": 100, "scheduler_cron": [] },
        },
    })
}

#[tokio::test]
async fn heartbeat_flags_new_version_until_agent_acks() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;

    // agent is current on version 1
    let (_, value) = stack.heartbeat_seen(a, 1).await;
    assert_eq!(value["config_updated"], false);

    // admin shortens the interval: version 2
    let (status, value) = stack.put_config(config_with_interval(300)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["version"], 2);

    // next heartbeat carries the flag
    let (_, value) = stack.heartbeat_seen(a, 1).await;
    assert_eq!(value["config_updated"], true);
    assert_eq!(value["next_heartbeat_in_seconds"], 300);

    // agent pulls the merged snapshot
    let (status, value) = stack.agent_get(a, "/api/v1/agents/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["version"], 2);
    assert_eq!(value["config"]["heartbeat"]["interval_in_seconds"], 300);

    // once acked, the flag clears
    let (_, value) = stack.heartbeat_seen(a, 2).await;
    assert_eq!(value["config_updated"], false);
}

#[tokio::test]
async fn invalid_config_is_rejected_and_version_unchanged() {
    let stack = stack();

    let (status, value) = stack.put_config(config_with_interval(59)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"]["code"], "VALIDATION_ERROR");

    // unknown keys are rejected by the strict schema
    let (status, _) = stack
        .put_config(json!({ "config": { "telemetry": { "enabled": true } } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    let (_, value) = stack.heartbeat_seen(a, 1).await;
    assert_eq!(value["config_updated"], false);
}
