// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatcher: atomic claim with visibility leases, lease extension,
//! and the background reclaim sweep.

use vg_core::{AgentId, Clock, Event, JobId, JobState, ScanStatus};
use vg_wire::{CompleteResponse, JobHandout, JobsResponse};

use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

/// Requeue back-off cap.
const BACKOFF_CAP_SECS: u64 = 900;

/// Exponential back-off from the configured base delay: `delay * 2^(n-1)`,
/// capped. `attempts` is the delivery attempt that just failed.
fn backoff_secs(base_delay_secs: u64, attempts: u32) -> u64 {
    let shift = attempts.saturating_sub(1).min(16);
    (base_delay_secs.saturating_mul(1u64 << shift)).min(BACKOFF_CAP_SECS)
}

impl<C: Clock> Engine<C> {
    /// Visibility lease length for one agent, from its merged config.
    pub(super) fn visibility_ms(
        &self,
        state: &vg_storage::MaterializedState,
        agent_id: &AgentId,
    ) -> u64 {
        let interval = state.config.merged(agent_id).heartbeat.interval_in_seconds;
        interval * self.limits.visibility_factor * 1000
    }

    /// Atomically move up to `claim_batch` ready jobs to `assigned` for
    /// this agent. An unauthorized or non-online agent always receives an
    /// empty list — queued work is never revealed.
    pub fn claim_jobs(&self, agent_id: AgentId) -> Result<JobsResponse, EngineError> {
        let now = self.clock.epoch_ms();
        let response = self.store.transact::<_, EngineError>(|state| {
            let rec =
                state.agents.get(&agent_id).ok_or(EngineError::AgentNotFound(agent_id))?;
            if rec.is_tombstoned() {
                return Err(EngineError::AgentDeregistered(agent_id));
            }
            if !rec.eligible_for_jobs() {
                return Ok((Vec::new(), JobsResponse::default()));
            }

            let deadline_ms = now + self.visibility_ms(state, &agent_id);
            let ready: Vec<JobId> = state
                .queues
                .get(&agent_id)
                .map(|queue| {
                    queue
                        .iter()
                        .filter(|id| state.jobs.get(*id).is_some_and(|j| j.ready_at(now)))
                        .take(self.limits.claim_batch)
                        .copied()
                        .collect()
                })
                .unwrap_or_default();

            let mut events = Vec::with_capacity(ready.len());
            let mut handouts = Vec::with_capacity(ready.len());
            for job_id in ready {
                let Some(job) = state.jobs.get(&job_id) else { continue };
                events.push(Event::JobClaimed { job_id, deadline_ms, epoch_ms: now });
                handouts.push(JobHandout {
                    job_id,
                    scan_id: job.scan_id,
                    attempts: job.attempts,
                    deadline_ms,
                    config: job.config.clone(),
                });
            }
            Ok((events, JobsResponse { jobs: handouts }))
        })?;
        if !response.jobs.is_empty() {
            tracing::debug!(%agent_id, handed = response.jobs.len(), "jobs claimed");
        }
        Ok(response)
    }

    /// `heartbeat_extend` ack: push the lease deadline out without a state
    /// change.
    pub fn extend_lease(
        &self,
        agent_id: AgentId,
        job_id: JobId,
    ) -> Result<CompleteResponse, EngineError> {
        let now = self.clock.epoch_ms();
        let response = self.store.transact::<_, EngineError>(|state| {
            let job = active_job(state, agent_id, job_id)?;
            let deadline_ms = now + self.visibility_ms(state, &job.agent_id);
            let state_kind = (&job.state).into();
            Ok((
                vec![Event::JobLeaseExtended { job_id, deadline_ms }],
                CompleteResponse { job_id, state: state_kind },
            ))
        })?;
        Ok(response)
    }

    /// Background reclaim sweep.
    ///
    /// Lapsed leases go back to the queue with a back-off, or to `expired`
    /// once delivery attempts are exhausted; leases on canceled scans die
    /// quietly. Queued jobs older than 24 h expire. Due jobs are
    /// snapshotted first and each transition is its own short critical
    /// section, re-checked against current state (the job may have been
    /// acked between the snapshot and the write). Running with nothing due
    /// writes nothing.
    pub fn reclaim_sweep(&self) -> Result<usize, EngineError> {
        let now = self.clock.epoch_ms();
        let due: Vec<JobId> = self.store.read(|state| {
            state
                .jobs
                .values()
                .filter(|job| job.lease_expired(now) || job.unclaimed_expired(now))
                .map(|job| job.job_id)
                .collect()
        });

        let mut moved = 0;
        for job_id in due {
            moved += self.store.transact::<_, EngineError>(|state| {
                let Some(job) = state.jobs.get(&job_id) else {
                    return Ok((Vec::new(), 0));
                };
                if job.lease_expired(now) {
                    let scan_live = state
                        .scans
                        .get(&job.scan_id)
                        .is_some_and(|s| s.status != ScanStatus::Canceled);
                    let merged = state.config.merged(&job.agent_id);
                    let event = if !scan_live {
                        Event::JobCanceled { job_id, epoch_ms: now }
                    } else if job.attempts >= merged.retry.attempts {
                        Event::JobExpired { job_id, epoch_ms: now }
                    } else {
                        let backoff = backoff_secs(merged.retry.delay_in_seconds, job.attempts);
                        Event::JobRequeued { job_id, not_before_ms: now + backoff * 1000 }
                    };
                    Ok((vec![event], 1))
                } else if job.unclaimed_expired(now) {
                    Ok((vec![Event::JobExpired { job_id, epoch_ms: now }], 1))
                } else {
                    Ok((Vec::new(), 0))
                }
            })?;
        }
        if moved > 0 {
            tracing::info!(moved, "reclaim sweep");
        }
        Ok(moved)
    }
}

/// Look up a job and check it is this agent's and still leased.
pub(super) fn active_job<'a>(
    state: &'a vg_storage::MaterializedState,
    agent_id: AgentId,
    job_id: JobId,
) -> Result<&'a vg_core::Job, EngineError> {
    match state.agents.get(&agent_id) {
        None => return Err(EngineError::AgentNotFound(agent_id)),
        Some(rec) if rec.is_tombstoned() => {
            // Deleted while holding the job: surfaced as not-found.
            return Err(EngineError::JobNotFound(job_id));
        }
        Some(_) => {}
    }
    let job = state.jobs.get(&job_id).ok_or(EngineError::JobNotFound(job_id))?;
    if job.agent_id != agent_id {
        return Err(EngineError::WrongAgent(job_id));
    }
    match job.state {
        JobState::Assigned { .. } | JobState::Running { .. } => Ok(job),
        ref terminal if job.is_terminal() => Err(EngineError::AlreadyFinalized {
            job_id,
            state: terminal.into(),
        }),
        ref other => Err(EngineError::JobNotActive { job_id, state: other.into() }),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
