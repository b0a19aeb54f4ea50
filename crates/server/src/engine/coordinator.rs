// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan coordinator: fan-out, rollup, results, cancel.

use std::collections::HashSet;

use vg_core::{Clock, Event, Job, JobState, JobStateKind, ScanId, ScanSpec, ScanStatus};
use vg_wire::{
    AgentRollup, CreateScanRequest, CreateScanResponse, ResultEntry, ResultsPage, ScanAction,
    ScanStatusResponse,
};

use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

impl<C: Clock> Engine<C> {
    /// Validate and materialize a scan: one job per target agent, enqueued
    /// atomically. Any unknown, unauthorized, or tombstoned target rejects
    /// the whole scan — no partial creation.
    pub fn create_scan(
        &self,
        request: &CreateScanRequest,
    ) -> Result<CreateScanResponse, EngineError> {
        let now = self.clock.epoch_ms();
        let response = self.store.transact::<_, EngineError>(|state| {
            let spec = ScanSpec {
                vts: request.vts.clone(),
                preferences: request.preferences.clone(),
                targets: request.targets.clone(),
                agent_ids: request.agent_ids.clone(),
            };
            spec.validate()?;

            let mut seen = HashSet::new();
            for agent_id in &spec.agent_ids {
                if !seen.insert(*agent_id) {
                    return Err(EngineError::DuplicateTargetAgent(*agent_id));
                }
                match state.agents.get(agent_id) {
                    None => return Err(EngineError::UnknownTargetAgent(*agent_id)),
                    Some(rec) if rec.is_tombstoned() => {
                        return Err(EngineError::TargetDeregistered(*agent_id))
                    }
                    Some(rec) if !rec.authorized => {
                        return Err(EngineError::TargetNotAuthorized(*agent_id))
                    }
                    Some(_) => {}
                }
            }

            let scan_id = ScanId::generate();
            let config = serde_json::json!({
                "vts": spec.vts,
                "preferences": spec.preferences,
                "targets": spec.targets,
            });
            let jobs: Vec<Job> = spec
                .agent_ids
                .iter()
                .enumerate()
                .map(|(i, agent_id)| Job {
                    job_id: vg_core::JobId::generate(),
                    scan_id,
                    agent_id: *agent_id,
                    state: JobState::Queued,
                    attempts: 1,
                    priority: request.priority,
                    enqueue_seq: state.enqueue_seq + i as u64,
                    not_before_ms: 0,
                    hostname: state.agents[agent_id].attrs.hostname.clone(),
                    config: config.clone(),
                    recorded_batches: Default::default(),
                    created_at_ms: now,
                    assigned_at_ms: None,
                    finished_at_ms: None,
                })
                .collect();

            let agents_assigned = jobs.len() as u32;
            let events = vec![Event::ScanCreated { scan_id, spec, jobs, epoch_ms: now }];
            Ok((
                events,
                CreateScanResponse { scan_id, status: ScanStatus::Queued, agents_assigned },
            ))
        })?;
        tracing::info!(scan_id = %response.scan_id, agents = response.agents_assigned, "scan created");
        Ok(response)
    }

    /// Aggregate status plus the per-agent rollup.
    pub fn scan_status(&self, scan_id: ScanId) -> Result<ScanStatusResponse, EngineError> {
        self.store.read(|state| {
            let scan = state.scans.get(&scan_id).ok_or(EngineError::ScanNotFound(scan_id))?;
            let mut rollup = AgentRollup { agents_total: scan.total_jobs, ..Default::default() };
            for job in state.jobs.values().filter(|j| j.scan_id == scan_id) {
                match JobStateKind::from(&job.state) {
                    JobStateKind::Queued => rollup.agents_queued += 1,
                    JobStateKind::Assigned | JobStateKind::Running => rollup.agents_running += 1,
                    JobStateKind::Completed => rollup.agents_completed += 1,
                    JobStateKind::Failed | JobStateKind::Expired | JobStateKind::Canceled => {
                        rollup.agents_failed += 1
                    }
                }
            }
            Ok(ScanStatusResponse {
                scan_id,
                status: scan.status,
                progress: scan.progress(),
                rollup,
                created_at_ms: scan.created_at_ms,
                started_at_ms: scan.started_at_ms,
                completed_at_ms: scan.completed_at_ms,
            })
        })
    }

    /// Paginated results ordered by submission. `range` is inclusive.
    pub fn scan_results(
        &self,
        scan_id: ScanId,
        range: Option<(usize, usize)>,
    ) -> Result<ResultsPage, EngineError> {
        self.store.read(|state| {
            if !state.scans.contains_key(&scan_id) {
                return Err(EngineError::ScanNotFound(scan_id));
            }
            let empty = Vec::new();
            let findings = state.results.get(&scan_id).unwrap_or(&empty);
            let total = findings.len();
            let (start, end) = match range {
                Some((a, b)) => (a, b),
                None => (0, total.saturating_sub(1)),
            };
            let results: Vec<ResultEntry> = findings
                .iter()
                .enumerate()
                .skip(start)
                .take_while(|(i, _)| *i <= end)
                .map(|(_, f)| ResultEntry::from(f))
                .collect();
            let end = if results.is_empty() { start } else { start + results.len() - 1 };
            Ok(ResultsPage { results, total, start, end })
        })
    }

    /// `start` is accepted as a no-op on a live scan (jobs are enqueued at
    /// creation); `stop` cancels. Either on a terminal scan is a conflict.
    pub fn scan_action(
        &self,
        scan_id: ScanId,
        action: ScanAction,
    ) -> Result<ScanStatusResponse, EngineError> {
        match action {
            ScanAction::Start => {
                self.store.read(|state| {
                    let scan =
                        state.scans.get(&scan_id).ok_or(EngineError::ScanNotFound(scan_id))?;
                    if scan.status.is_terminal() {
                        return Err(EngineError::ScanAlreadyTerminal(scan_id));
                    }
                    Ok(())
                })?;
            }
            ScanAction::Stop => self.cancel_scan(scan_id)?,
        }
        self.scan_status(scan_id)
    }

    /// Cancel: queued jobs die now, delivered jobs drain through their
    /// leases and their late results are still accepted.
    pub fn cancel_scan(&self, scan_id: ScanId) -> Result<(), EngineError> {
        let now = self.clock.epoch_ms();
        self.store.transact::<_, EngineError>(|state| {
            let scan = state.scans.get(&scan_id).ok_or(EngineError::ScanNotFound(scan_id))?;
            if scan.status.is_terminal() {
                return Err(EngineError::ScanAlreadyTerminal(scan_id));
            }
            let mut events = vec![Event::ScanCanceled { scan_id, epoch_ms: now }];
            for job in state.jobs.values() {
                if job.scan_id == scan_id && matches!(job.state, JobState::Queued) {
                    events.push(Event::JobCanceled { job_id: job.job_id, epoch_ms: now });
                }
            }
            Ok((events, ()))
        })?;
        tracing::info!(%scan_id, "scan canceled");
        Ok(())
    }

    /// Remove the scan, its jobs, and its results.
    pub fn delete_scan(&self, scan_id: ScanId) -> Result<(), EngineError> {
        self.store.transact::<_, EngineError>(|state| {
            if !state.scans.contains_key(&scan_id) {
                return Err(EngineError::ScanNotFound(scan_id));
            }
            Ok((vec![Event::ScanDeleted { scan_id }], ()))
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
