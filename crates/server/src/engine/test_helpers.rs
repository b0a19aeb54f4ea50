// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::store::Store;
use vg_core::test_support::{agent_uuid, declared_attrs};
use vg_core::{AgentId, FakeClock};

use super::{Engine, Limits};

/// Engine over a fresh store with a controllable clock.
pub(crate) fn test_engine() -> (Engine<FakeClock>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    (Engine::new(store, clock, Limits::default()), dir)
}

/// Heartbeat + authorize agent `n`, returning its id.
pub(crate) fn online_agent(engine: &Engine<FakeClock>, n: u8) -> AgentId {
    let agent_id = agent_uuid(n);
    engine.heartbeat(agent_id.as_str(), declared_attrs(&format!("host-{n}")), 0).unwrap();
    let results = engine
        .bulk_patch(
            &[agent_id],
            &vg_core::AgentPatch { authorized: Some(true), update_to_latest: None },
        )
        .unwrap();
    assert!(results[0].ok);
    agent_id
}

/// Create a scan targeting the given agents, returning the scan id.
pub(crate) fn fanout_scan(
    engine: &Engine<FakeClock>,
    agents: &[AgentId],
) -> vg_core::ScanId {
    let response = engine
        .create_scan(&vg_wire::CreateScanRequest {
            vts: vec!["1.3.6.1.4.1.25623.1.0.10662".to_string()],
            preferences: Default::default(),
            targets: vg_core::ScanTargets { hosts: vec!["localhost".to_string()], ports: None },
            agent_ids: agents.to_vec(),
            priority: 0,
        })
        .unwrap();
    response.scan_id
}
