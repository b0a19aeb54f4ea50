// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay.

mod agents;
mod config;
mod jobs;
mod results;
mod scans;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use vg_core::{AgentId, AgentRecord, ConfigHistory, Event, Finding, Job, JobId, Scan, ScanId};

/// Materialized state built from WAL events.
///
/// The maps are the conceptual tables from the persistence layout: agents,
/// scans, jobs, results, plus the config history. `queues` is a runtime
/// index over queued job rows and is rebuilt on load, never persisted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub agents: HashMap<AgentId, AgentRecord>,
    pub scans: HashMap<ScanId, Scan>,
    pub jobs: HashMap<JobId, Job>,
    /// Findings per scan, in submission order — destroyed with the scan.
    pub results: HashMap<ScanId, Vec<Finding>>,
    #[serde(default)]
    pub config: ConfigHistory,
    /// Next enqueue sequence for job creation.
    #[serde(default)]
    pub enqueue_seq: u64,
    /// Per-agent dispatch order: queued job ids sorted by
    /// `(priority desc, enqueue_seq asc)`. Runtime-only; rebuilt from job
    /// rows by [`rebuild_indices`](Self::rebuild_indices).
    #[serde(skip)]
    pub queues: HashMap<AgentId, Vec<JobId>>,
}

impl MaterializedState {
    /// Apply an event to derive state changes.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent** — see [`vg_core::Event`].
    /// Events are re-applied when replay overlaps a snapshot.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::AgentRegistered { .. }
            | Event::AgentRefreshed { .. }
            | Event::AgentAuthorized { .. }
            | Event::AgentUpdated { .. }
            | Event::AgentDeleted { .. }
            | Event::AgentPurged { .. }
            | Event::AgentLiveness { .. }
            | Event::AgentConfigSeen { .. } => agents::apply(self, event),

            Event::ScanCreated { .. } | Event::ScanCanceled { .. } | Event::ScanDeleted { .. } => {
                scans::apply(self, event)
            }

            Event::JobClaimed { .. }
            | Event::JobStarted { .. }
            | Event::JobLeaseExtended { .. }
            | Event::JobRequeued { .. }
            | Event::JobExpired { .. }
            | Event::JobFinalized { .. }
            | Event::JobCanceled { .. } => jobs::apply(self, event),

            Event::ResultsRecorded { .. } => results::apply(self, event),

            Event::ConfigUpdated { .. } => config::apply(self, event),
        }
    }

    /// Rebuild runtime indices and re-derive scan counters from job rows.
    ///
    /// Called after snapshot load + WAL replay. The job rows are the truth;
    /// counters and queues are views over them.
    pub fn rebuild_indices(&mut self) {
        self.queues.clear();
        let mut queued: Vec<&Job> =
            self.jobs.values().filter(|j| matches!(j.state, vg_core::JobState::Queued)).collect();
        queued.sort_by_key(|j| (std::cmp::Reverse(j.priority), j.enqueue_seq));
        for job in queued {
            self.queues.entry(job.agent_id).or_default().push(job.job_id);
        }

        for scan in self.scans.values_mut() {
            let mut terminal = 0u32;
            let mut succeeded = 0u32;
            let mut started = None;
            let mut finished = scan.created_at_ms;
            for job in self.jobs.values().filter(|j| j.scan_id == scan.scan_id) {
                if job.is_terminal() {
                    terminal += 1;
                }
                if matches!(job.state, vg_core::JobState::Completed) {
                    succeeded += 1;
                }
                if let Some(at) = job.assigned_at_ms {
                    started = Some(started.map_or(at, |s: u64| s.min(at)));
                }
                if let Some(at) = job.finished_at_ms {
                    finished = finished.max(at);
                }
            }
            scan.terminal_jobs = terminal;
            scan.succeeded_jobs = succeeded;
            if !scan.status.is_terminal() {
                if let Some(at) = started {
                    scan.note_dispatch(at);
                }
                if terminal == scan.total_jobs && scan.total_jobs > 0 {
                    scan.status = if succeeded > 0 {
                        vg_core::ScanStatus::Completed
                    } else {
                        vg_core::ScanStatus::Failed
                    };
                    scan.completed_at_ms = Some(finished);
                }
            }
        }
    }

    /// Insert a job id into its agent's dispatch queue, keeping
    /// `(priority desc, enqueue_seq asc)` order.
    pub(crate) fn enqueue(&mut self, job_id: JobId) {
        let Some(job) = self.jobs.get(&job_id) else { return };
        let key = (std::cmp::Reverse(job.priority), job.enqueue_seq);
        let queue = self.queues.entry(job.agent_id).or_default();
        if queue.contains(&job_id) {
            return;
        }
        let pos = queue
            .iter()
            .position(|id| {
                self.jobs
                    .get(id)
                    .map(|j| (std::cmp::Reverse(j.priority), j.enqueue_seq) > key)
                    .unwrap_or(false)
            })
            .unwrap_or(queue.len());
        queue.insert(pos, job_id);
    }

    /// Remove a job id from its agent's dispatch queue.
    pub(crate) fn dequeue(&mut self, agent_id: &AgentId, job_id: &JobId) {
        if let Some(queue) = self.queues.get_mut(agent_id) {
            queue.retain(|id| id != job_id);
            if queue.is_empty() {
                self.queues.remove(agent_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
