// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan/job lifecycle through events: queues, counters, termination.

use super::*;
use vg_core::ScanStatus;

#[test]
fn scan_creation_materializes_jobs_and_queues() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let b = seeded_agent(&mut state, 2, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a, b], 1_500);

    assert_eq!(state.scans[&scan_id].total_jobs, 2);
    assert_eq!(state.scans[&scan_id].status, ScanStatus::Queued);
    assert_eq!(state.jobs.len(), 2);
    assert_eq!(state.queues[&a], vec![job_ids[0]]);
    assert_eq!(state.queues[&b], vec![job_ids[1]]);
}

#[test]
fn replayed_scan_creation_is_idempotent() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a], 1_500);

    let claim = Event::JobClaimed { job_id: job_ids[0], deadline_ms: 9_000, epoch_ms: 2_000 };
    state.apply_event(&claim);

    // replaying the creation must not resurrect the queue entry
    let snapshot = state.clone();
    state.apply_event(&Event::ScanCreated {
        scan_id,
        spec: scan_spec(vec![a]),
        jobs: vec![],
        epoch_ms: 1_500,
    });
    assert_eq!(state.jobs.len(), snapshot.jobs.len());
    assert!(state.queues.get(&a).is_none());
}

#[test]
fn claim_assigns_and_starts_the_scan() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a], 1_500);

    state.apply_event(&Event::JobClaimed {
        job_id: job_ids[0],
        deadline_ms: 9_000,
        epoch_ms: 2_000,
    });

    let job = &state.jobs[&job_ids[0]];
    assert_eq!(job.state, JobState::Assigned { deadline_ms: 9_000 });
    assert_eq!(job.assigned_at_ms, Some(2_000));
    assert!(state.queues.get(&a).is_none());
    assert_eq!(state.scans[&scan_id].status, ScanStatus::Running);
    assert_eq!(state.scans[&scan_id].started_at_ms, Some(2_000));
}

#[test]
fn double_claim_replay_is_a_noop() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (_, job_ids) = seeded_scan(&mut state, &[a], 1_500);

    let claim = Event::JobClaimed { job_id: job_ids[0], deadline_ms: 9_000, epoch_ms: 2_000 };
    state.apply_event(&claim);
    let before = state.clone();
    state.apply_event(&claim);
    assert_eq!(state.jobs[&job_ids[0]], before.jobs[&job_ids[0]]);
}

#[test]
fn first_batch_starts_then_finalize_completes() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a], 1_500);
    let job_id = job_ids[0];

    state.apply_event(&Event::JobClaimed { job_id, deadline_ms: 9_000, epoch_ms: 2_000 });
    state.apply_event(&Event::JobStarted { job_id, deadline_ms: 10_000 });
    assert_eq!(state.jobs[&job_id].state, JobState::Running { deadline_ms: 10_000 });

    state.apply_event(&Event::ResultsRecorded {
        job_id,
        batch_seq: 1,
        findings: vec![finding_for(scan_id, a, job_id)],
        epoch_ms: 2_500,
    });
    state.apply_event(&Event::JobFinalized {
        job_id,
        outcome: JobOutcome::Completed,
        epoch_ms: 3_000,
    });

    let scan = &state.scans[&scan_id];
    assert_eq!(scan.status, ScanStatus::Completed);
    assert_eq!(scan.progress(), 100);
    assert_eq!(scan.terminal_jobs, 1);
    assert_eq!(scan.succeeded_jobs, 1);
    assert_eq!(state.results[&scan_id].len(), 1);
}

#[test]
fn duplicate_batch_is_dropped() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a], 1_500);
    let job_id = job_ids[0];
    state.apply_event(&Event::JobClaimed { job_id, deadline_ms: 9_000, epoch_ms: 2_000 });
    state.apply_event(&Event::JobStarted { job_id, deadline_ms: 10_000 });

    let record = Event::ResultsRecorded {
        job_id,
        batch_seq: 1,
        findings: vec![finding_for(scan_id, a, job_id)],
        epoch_ms: 2_500,
    };
    state.apply_event(&record);
    state.apply_event(&record);
    assert_eq!(state.results[&scan_id].len(), 1);
}

#[test]
fn requeue_bumps_attempts_once() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (_, job_ids) = seeded_scan(&mut state, &[a], 1_500);
    let job_id = job_ids[0];
    state.apply_event(&Event::JobClaimed { job_id, deadline_ms: 9_000, epoch_ms: 2_000 });

    let requeue = Event::JobRequeued { job_id, not_before_ms: 12_000 };
    state.apply_event(&requeue);
    state.apply_event(&requeue);

    let job = &state.jobs[&job_id];
    assert_eq!(job.state, JobState::Queued);
    assert_eq!(job.attempts, 2);
    assert_eq!(job.not_before_ms, 12_000);
    assert_eq!(state.queues[&a], vec![job_id]);
}

#[test]
fn mixed_outcomes_complete_the_scan() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let b = seeded_agent(&mut state, 2, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a, b], 1_500);

    state.apply_event(&Event::JobClaimed {
        job_id: job_ids[0],
        deadline_ms: 9_000,
        epoch_ms: 2_000,
    });
    state.apply_event(&Event::JobStarted { job_id: job_ids[0], deadline_ms: 10_000 });
    state.apply_event(&Event::JobFinalized {
        job_id: job_ids[0],
        outcome: JobOutcome::Completed,
        epoch_ms: 3_000,
    });
    state.apply_event(&Event::JobExpired { job_id: job_ids[1], epoch_ms: 90_000_000 });

    let scan = &state.scans[&scan_id];
    assert_eq!(scan.status, ScanStatus::Completed);
    assert_eq!(scan.progress(), 100);
    assert_eq!(scan.succeeded_jobs, 1);
}

#[test]
fn canceled_scan_stays_canceled_while_leases_drain() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let b = seeded_agent(&mut state, 2, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a, b], 1_500);

    // a's job is delivered; b's is still queued
    state.apply_event(&Event::JobClaimed {
        job_id: job_ids[0],
        deadline_ms: 9_000,
        epoch_ms: 2_000,
    });
    state.apply_event(&Event::ScanCanceled { scan_id, epoch_ms: 2_500 });
    state.apply_event(&Event::JobCanceled { job_id: job_ids[1], epoch_ms: 2_500 });

    assert_eq!(state.scans[&scan_id].status, ScanStatus::Canceled);
    // the delivered job can still finish its work
    state.apply_event(&Event::JobStarted { job_id: job_ids[0], deadline_ms: 10_000 });
    state.apply_event(&Event::ResultsRecorded {
        job_id: job_ids[0],
        batch_seq: 1,
        findings: vec![finding_for(scan_id, a, job_ids[0])],
        epoch_ms: 2_600,
    });
    state.apply_event(&Event::JobFinalized {
        job_id: job_ids[0],
        outcome: JobOutcome::Completed,
        epoch_ms: 3_000,
    });
    assert_eq!(state.scans[&scan_id].status, ScanStatus::Canceled);
    assert_eq!(state.results[&scan_id].len(), 1);
}

#[test]
fn scan_deletion_removes_jobs_and_results() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    let (scan_id, job_ids) = seeded_scan(&mut state, &[a], 1_500);

    state.apply_event(&Event::ScanDeleted { scan_id });
    assert!(!state.scans.contains_key(&scan_id));
    assert!(!state.jobs.contains_key(&job_ids[0]));
    assert!(state.queues.get(&a).is_none());
    assert!(!state.results.contains_key(&scan_id));
}

#[test]
fn queue_respects_priority_then_fifo() {
    let mut state = MaterializedState::default();
    let a = seeded_agent(&mut state, 1, 1_000);
    // three scans targeting the same agent, enqueued low, low, urgent
    let mut job_ids = Vec::new();
    for (seq, priority) in [(0u64, 0), (1u64, 0), (2u64, 5)] {
        let scan_id = ScanId::generate();
        let job = Job::builder()
            .scan_id(scan_id)
            .agent_id(a)
            .priority(priority)
            .enqueue_seq(seq)
            .created_at_ms(1_500_u64)
            .build();
        job_ids.push(job.job_id);
        state.apply_event(&Event::ScanCreated {
            scan_id,
            spec: scan_spec(vec![a]),
            jobs: vec![job],
            epoch_ms: 1_500,
        });
    }
    // urgent first, then FIFO among equal priorities
    assert_eq!(state.queues[&a], vec![job_ids[2], job_ids[0], job_ids[1]]);
}
