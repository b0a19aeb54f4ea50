// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state event handlers.
//!
//! Every handler is guarded by the job's current state so replaying an
//! event a second time is a no-op — this is what keeps scan counters
//! correct across snapshot/replay overlap.

use vg_core::{Event, JobOutcome, JobState};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobClaimed { job_id, deadline_ms, epoch_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else { return };
            if !matches!(job.state, JobState::Queued) {
                return;
            }
            job.state = JobState::Assigned { deadline_ms: *deadline_ms };
            job.assigned_at_ms = Some(*epoch_ms);
            let (agent_id, scan_id) = (job.agent_id, job.scan_id);
            state.dequeue(&agent_id, job_id);
            if let Some(scan) = state.scans.get_mut(&scan_id) {
                scan.note_dispatch(*epoch_ms);
            }
        }

        Event::JobStarted { job_id, deadline_ms } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                if matches!(job.state, JobState::Assigned { .. } | JobState::Running { .. }) {
                    job.state = JobState::Running { deadline_ms: *deadline_ms };
                }
            }
        }

        Event::JobLeaseExtended { job_id, deadline_ms } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                match job.state {
                    JobState::Assigned { .. } => {
                        job.state = JobState::Assigned { deadline_ms: *deadline_ms };
                    }
                    JobState::Running { .. } => {
                        job.state = JobState::Running { deadline_ms: *deadline_ms };
                    }
                    _ => {}
                }
            }
        }

        Event::JobRequeued { job_id, not_before_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else { return };
            if !matches!(job.state, JobState::Assigned { .. } | JobState::Running { .. }) {
                return;
            }
            job.state = JobState::Queued;
            // Guarded by the state check above, so replay cannot
            // double-count the attempt. recorded_batches stays: batches
            // persisted during the lost lease remain deduplicated.
            job.attempts += 1;
            job.not_before_ms = *not_before_ms;
            state.enqueue(*job_id);
        }

        Event::JobExpired { job_id, epoch_ms } => {
            finish(state, job_id, JobState::Expired, *epoch_ms);
        }

        Event::JobFinalized { job_id, outcome, epoch_ms } => {
            let terminal = match outcome {
                JobOutcome::Completed => JobState::Completed,
                JobOutcome::Failed { reason } => JobState::Failed { reason: reason.clone() },
            };
            finish(state, job_id, terminal, *epoch_ms);
        }

        Event::JobCanceled { job_id, epoch_ms } => {
            finish(state, job_id, JobState::Canceled, *epoch_ms);
        }

        _ => {}
    }
}

/// Move a job into a terminal state and bump its scan's counters.
/// No-op when the job is already terminal.
fn finish(state: &mut MaterializedState, job_id: &vg_core::JobId, terminal: JobState, epoch_ms: u64) {
    let Some(job) = state.jobs.get_mut(job_id) else { return };
    if job.is_terminal() {
        return;
    }
    let succeeded = matches!(terminal, JobState::Completed);
    job.state = terminal;
    job.finished_at_ms = Some(epoch_ms);
    let (agent_id, scan_id) = (job.agent_id, job.scan_id);
    state.dequeue(&agent_id, job_id);
    if let Some(scan) = state.scans.get_mut(&scan_id) {
        scan.note_job_terminal(succeeded, epoch_ms);
    }
}
