// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat silence demotes agents; any heartbeat restores them.

use super::helpers::{agent_a, stack};

async fn liveness_of(stack: &super::helpers::Stack, agent: vg_core::AgentId) -> String {
    let (_, value) = stack.admin_agents("").await;
    value["agents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["agent_id"] == agent.as_str())
        .map(|entry| entry["liveness"].as_str().unwrap().to_string())
        .unwrap_or_else(|| "missing".to_string())
}

#[tokio::test]
async fn demotion_to_offline_then_inactive_then_recovery() {
    let stack = stack();
    let a = agent_a();
    stack.heartbeat(a).await;
    stack.authorize(a).await;
    assert_eq!(liveness_of(&stack, a).await, "online");

    // interval 600, miss_until_inactive 1: offline past 1200s of silence
    stack.advance_secs(1_200);
    assert_eq!(stack.engine.liveness_sweep().unwrap(), 0);
    stack.advance_secs(1);
    assert_eq!(stack.engine.liveness_sweep().unwrap(), 1);
    assert_eq!(liveness_of(&stack, a).await, "offline");

    // 24h after the last heartbeat: inactive
    stack.advance_secs(24 * 3600 - 1_201 + 2);
    assert_eq!(stack.engine.liveness_sweep().unwrap(), 1);
    assert_eq!(liveness_of(&stack, a).await, "inactive");

    // any heartbeat restores online
    stack.heartbeat(a).await;
    assert_eq!(liveness_of(&stack, a).await, "online");
}
