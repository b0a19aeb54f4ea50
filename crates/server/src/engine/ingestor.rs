// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result ingestor: validated batch persistence and job finalization.

use vg_core::{
    validate_batch, AgentId, Clock, Event, Finding, JobId, JobOutcome, JobState, JobStateKind,
    ResultId,
};
use vg_wire::{CompleteResponse, ResultsAccepted, ResultsSubmission};

use super::dispatcher::active_job;
use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

impl<C: Clock> Engine<C> {
    /// Persist one result batch.
    ///
    /// The batch is validated whole — nothing from a bad batch lands. The
    /// first batch moves the job to `running`; every batch extends the
    /// visibility lease. A batch sequence we have seen before is an
    /// idempotent success with no side effects.
    pub fn submit_results(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        submission: &ResultsSubmission,
    ) -> Result<ResultsAccepted, EngineError> {
        let now = self.clock.epoch_ms();
        let accepted = self.store.transact::<_, EngineError>(|state| {
            let job = active_job(state, agent_id, job_id)?;

            if job.recorded_batches.contains(&submission.batch_sequence) {
                return Ok((
                    Vec::new(),
                    ResultsAccepted {
                        accepted: submission.results.len(),
                        batch_sequence: submission.batch_sequence,
                    },
                ));
            }

            validate_batch(&submission.results)?;

            let deadline_ms = now + self.visibility_ms(state, &agent_id);
            let findings: Vec<Finding> = submission
                .results
                .iter()
                .map(|draft| Finding {
                    result_id: ResultId::generate(),
                    scan_id: job.scan_id,
                    agent_id: job.agent_id,
                    job_id,
                    agent_hostname: job.hostname.clone(),
                    oid: draft.oid.clone(),
                    host: draft.host.clone(),
                    port: draft.port.clone(),
                    severity: draft.severity,
                    threat: draft.threat,
                    description: draft.description.clone(),
                    qod: draft.qod,
                    created_at_ms: now,
                })
                .collect();

            let lease = match job.state {
                JobState::Assigned { .. } => Event::JobStarted { job_id, deadline_ms },
                _ => Event::JobLeaseExtended { job_id, deadline_ms },
            };
            let events = vec![
                lease,
                Event::ResultsRecorded {
                    job_id,
                    batch_seq: submission.batch_sequence,
                    findings,
                    epoch_ms: now,
                },
            ];
            Ok((
                events,
                ResultsAccepted {
                    accepted: submission.results.len(),
                    batch_sequence: submission.batch_sequence,
                },
            ))
        })?;
        Ok(accepted)
    }

    /// Terminal acknowledgement.
    ///
    /// `completed` requires at least one persisted batch; `failed` is
    /// accepted bare. The first finalize wins — a second returns
    /// `already_finalized` with nothing changed.
    pub fn finalize_job(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        outcome: JobOutcome,
        summary: Option<&str>,
    ) -> Result<CompleteResponse, EngineError> {
        let now = self.clock.epoch_ms();
        let response = self.store.transact::<_, EngineError>(|state| {
            let job = active_job(state, agent_id, job_id)?;
            if matches!(outcome, JobOutcome::Completed)
                && !matches!(job.state, JobState::Running { .. })
            {
                return Err(EngineError::CompletionWithoutResults);
            }
            let state_after = match &outcome {
                JobOutcome::Completed => JobStateKind::Completed,
                JobOutcome::Failed { .. } => JobStateKind::Failed,
            };
            let events =
                vec![Event::JobFinalized { job_id, outcome: outcome.clone(), epoch_ms: now }];
            Ok((events, CompleteResponse { job_id, state: state_after }))
        })?;
        if let Some(summary) = summary {
            tracing::info!(%job_id, state = %response.state, summary, "job finalized");
        } else {
            tracing::info!(%job_id, state = %response.state, "job finalized");
        }
        Ok(response)
    }
}

#[cfg(test)]
#[path = "ingestor_tests.rs"]
mod tests;
