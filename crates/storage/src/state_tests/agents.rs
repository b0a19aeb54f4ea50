// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn registration_creates_pending_record() {
    let mut state = MaterializedState::default();
    let agent_id = agent_uuid(1);
    state.apply_event(&Event::AgentRegistered {
        agent_id,
        attrs: declared_attrs("edge-1"),
        epoch_ms: 1_000,
    });

    let agent = &state.agents[&agent_id];
    assert!(!agent.authorized);
    assert_eq!(agent.liveness, Liveness::Pending);
    assert_eq!(agent.attrs.hostname, "edge-1");
}

#[test]
fn duplicate_registration_keeps_first_record() {
    let mut state = MaterializedState::default();
    let agent_id = agent_uuid(1);
    let register = Event::AgentRegistered {
        agent_id,
        attrs: declared_attrs("edge-1"),
        epoch_ms: 1_000,
    };
    state.apply_event(&register);
    state.apply_event(&Event::AgentAuthorized { agent_id, authorized: true, epoch_ms: 1_500 });
    // replayed registration must not reset authorization
    state.apply_event(&register);
    assert!(state.agents[&agent_id].authorized);
}

#[test]
fn refresh_bumps_heartbeat_monotonically() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);

    state.apply_event(&Event::AgentRefreshed {
        agent_id,
        attrs: declared_attrs("edge-1"),
        epoch_ms: 5_000,
    });
    assert_eq!(state.agents[&agent_id].last_heartbeat_ms, 5_000);

    // a delayed write with an older wall clock loses
    state.apply_event(&Event::AgentRefreshed {
        agent_id,
        attrs: declared_attrs("edge-1"),
        epoch_ms: 3_000,
    });
    assert_eq!(state.agents[&agent_id].last_heartbeat_ms, 5_000);
}

#[test]
fn refresh_never_overwrites_authorization() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);
    state.apply_event(&Event::AgentRefreshed {
        agent_id,
        attrs: declared_attrs("edge-1"),
        epoch_ms: 2_000,
    });
    assert!(state.agents[&agent_id].authorized);
    assert_eq!(state.agents[&agent_id].liveness, Liveness::Online);
}

#[test]
fn liveness_event_applies_sweep_result() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);
    state.apply_event(&Event::AgentLiveness {
        agent_id,
        liveness: Liveness::Offline,
        epoch_ms: 9_000,
    });
    assert_eq!(state.agents[&agent_id].liveness, Liveness::Offline);
}

#[test]
fn delete_tombstones_and_purge_removes() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);

    state.apply_event(&Event::AgentDeleted { agent_id, epoch_ms: 2_000 });
    assert_eq!(state.agents[&agent_id].liveness, Liveness::Tombstoned);

    state.apply_event(&Event::AgentPurged { agent_id });
    assert!(!state.agents.contains_key(&agent_id));
}

#[test]
fn config_seen_is_monotonic() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);

    state.apply_event(&Event::AgentConfigSeen { agent_id, version: 7 });
    state.apply_event(&Event::AgentConfigSeen { agent_id, version: 5 });
    assert_eq!(state.agents[&agent_id].config_version_seen, 7);
}

#[test]
fn update_patch_only_touches_update_flag() {
    let mut state = MaterializedState::default();
    let agent_id = seeded_agent(&mut state, 1, 1_000);
    state.apply_event(&Event::AgentUpdated {
        agent_id,
        patch: vg_core::AgentPatch { authorized: Some(false), update_to_latest: Some(true) },
        epoch_ms: 2_000,
    });
    let agent = &state.agents[&agent_id];
    assert!(agent.update_to_latest);
    // authorization only moves via its own event
    assert!(agent.authorized);
}

#[test]
fn config_update_moves_version_forward_only() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::ConfigUpdated {
        version: 2,
        document: vg_core::ConfigDocument::default(),
        epoch_ms: 1_000,
    });
    assert_eq!(state.config.version, 2);

    state.apply_event(&Event::ConfigUpdated {
        version: 2,
        document: vg_core::ConfigDocument::default(),
        epoch_ms: 9_000,
    });
    assert_eq!(state.config.updated_at_ms, 1_000);
}
