// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay semantics: double-application and index rebuilds.

use super::*;

/// A full happy-path event log for two agents.
fn event_log() -> (Vec<Event>, ScanId) {
    let a = agent_uuid(1);
    let b = agent_uuid(2);
    let scan_id = ScanId::generate();
    let job_ids = [JobId::generate(), JobId::generate()];

    let log = vec![
        Event::AgentRegistered { agent_id: a, attrs: declared_attrs("host-1"), epoch_ms: 1_000 },
        Event::AgentAuthorized { agent_id: a, authorized: true, epoch_ms: 1_100 },
        Event::AgentRegistered { agent_id: b, attrs: declared_attrs("host-2"), epoch_ms: 1_000 },
        Event::AgentAuthorized { agent_id: b, authorized: true, epoch_ms: 1_100 },
        Event::ScanCreated {
            scan_id,
            spec: scan_spec(vec![a, b]),
            jobs: vec![
                Job::builder()
                    .job_id(job_ids[0])
                    .scan_id(scan_id)
                    .agent_id(a)
                    .enqueue_seq(0_u64)
                    .created_at_ms(1_500_u64)
                    .build(),
                Job::builder()
                    .job_id(job_ids[1])
                    .scan_id(scan_id)
                    .agent_id(b)
                    .enqueue_seq(1_u64)
                    .created_at_ms(1_500_u64)
                    .build(),
            ],
            epoch_ms: 1_500,
        },
        Event::JobClaimed { job_id: job_ids[0], deadline_ms: 9_000, epoch_ms: 2_000 },
        Event::JobStarted { job_id: job_ids[0], deadline_ms: 10_000 },
        Event::ResultsRecorded {
            job_id: job_ids[0],
            batch_seq: 1,
            findings: vec![finding_for(scan_id, a, job_ids[0])],
            epoch_ms: 2_500,
        },
        Event::JobFinalized { job_id: job_ids[0], outcome: JobOutcome::Completed, epoch_ms: 3_000 },
        Event::JobExpired { job_id: job_ids[1], epoch_ms: 90_000_000 },
    ];
    (log, scan_id)
}

fn states_equal(a: &MaterializedState, b: &MaterializedState) -> bool {
    // Compare through serde so runtime-only indices are excluded.
    serde_json::to_value(a).ok() == serde_json::to_value(b).ok()
}

#[test]
fn double_application_yields_the_same_state() {
    let (log, _) = event_log();

    let mut once = MaterializedState::default();
    for event in &log {
        once.apply_event(event);
    }

    let mut twice = MaterializedState::default();
    for event in &log {
        twice.apply_event(event);
        twice.apply_event(event);
    }

    assert!(states_equal(&once, &twice));
}

#[test]
fn rebuild_indices_rederives_counters_from_job_rows() {
    let (log, scan_id) = event_log();
    let mut state = MaterializedState::default();
    for event in &log {
        state.apply_event(event);
    }

    // simulate stale counters from an interrupted run
    {
        let scan = state.scans.get_mut(&scan_id).unwrap();
        scan.terminal_jobs = 0;
        scan.succeeded_jobs = 0;
        scan.status = vg_core::ScanStatus::Running;
        scan.completed_at_ms = None;
    }
    state.rebuild_indices();

    let scan = &state.scans[&scan_id];
    assert_eq!(scan.terminal_jobs, 2);
    assert_eq!(scan.succeeded_jobs, 1);
    assert_eq!(scan.status, vg_core::ScanStatus::Completed);
    assert_eq!(scan.progress(), 100);
}

#[test]
fn rebuild_indices_restores_queues() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (_, job_ids) = seeded_scan(&mut state, &[a], 1_500);

    state.queues.clear();
    state.rebuild_indices();
    assert_eq!(state.queues[&a], vec![job_ids[0]]);
}

#[test]
fn serde_roundtrip_plus_rebuild_preserves_semantics() {
    let (log, _) = event_log();
    let mut state = MaterializedState::default();
    for event in &log {
        state.apply_event(event);
    }
    state.rebuild_indices();

    let json = serde_json::to_string(&state).unwrap();
    let mut restored: MaterializedState = serde_json::from_str(&json).unwrap();
    restored.rebuild_indices();

    assert!(states_equal(&state, &restored));
    assert_eq!(restored.queues, state.queues);
}
