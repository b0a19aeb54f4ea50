// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive all persistent state transitions.
//!
//! Every mutation the controller performs is expressed as one of these
//! facts, appended to the WAL and applied to the materialized state.
//!
//! # Idempotency Requirement
//!
//! **All event handlers MUST be idempotent.** Applying the same event twice
//! must produce the same state as applying it once — events are re-applied
//! during WAL replay after snapshot recovery. Guidelines:
//!
//! - Use assignment (`=`) instead of mutation (`+=`, `-=`)
//! - Guard inserts with existence checks
//! - Guard counter bumps with status checks (only bump on a real transition)

use crate::agent::{AgentPatch, DeclaredAttrs, Liveness};
use crate::config::ConfigDocument;
use crate::finding::Finding;
use crate::id::{AgentId, JobId, ScanId};
use crate::job::{Job, JobOutcome};
use crate::scan::ScanSpec;
use serde::{Deserialize, Serialize};

/// Serializes with `{"type": "family:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- agent registry --
    #[serde(rename = "agent:registered")]
    AgentRegistered { agent_id: AgentId, attrs: DeclaredAttrs, epoch_ms: u64 },

    /// Heartbeat: attributes re-declared, last_heartbeat bumped
    /// (monotonic), liveness restored.
    #[serde(rename = "agent:refreshed")]
    AgentRefreshed { agent_id: AgentId, attrs: DeclaredAttrs, epoch_ms: u64 },

    /// Admin flipped the authorization gate.
    #[serde(rename = "agent:authorized")]
    AgentAuthorized { agent_id: AgentId, authorized: bool, epoch_ms: u64 },

    /// Admin partial update (anything but `authorized`, which has its own
    /// event so heartbeat refreshes can never race it away).
    #[serde(rename = "agent:updated")]
    AgentUpdated { agent_id: AgentId, patch: AgentPatch, epoch_ms: u64 },

    /// Admin soft-delete: tombstone until the agent has been told.
    #[serde(rename = "agent:deleted")]
    AgentDeleted { agent_id: AgentId, epoch_ms: u64 },

    /// The deregistered signal was delivered; the record is gone.
    #[serde(rename = "agent:purged")]
    AgentPurged { agent_id: AgentId },

    /// Liveness sweep transition (only real transitions are recorded).
    #[serde(rename = "agent:liveness")]
    AgentLiveness { agent_id: AgentId, liveness: Liveness, epoch_ms: u64 },

    /// Agent acknowledged a config version in its heartbeat.
    #[serde(rename = "agent:config-seen")]
    AgentConfigSeen { agent_id: AgentId, version: u64 },

    // -- scans --
    /// Atomic materialization: the scan row plus every job row it fans out
    /// to, in one fact. Replay can never observe a half-created scan.
    #[serde(rename = "scan:created")]
    ScanCreated { scan_id: ScanId, spec: ScanSpec, jobs: Vec<Job>, epoch_ms: u64 },

    #[serde(rename = "scan:canceled")]
    ScanCanceled { scan_id: ScanId, epoch_ms: u64 },

    /// Scan and its results removed.
    #[serde(rename = "scan:deleted")]
    ScanDeleted { scan_id: ScanId },

    // -- jobs --
    #[serde(rename = "job:claimed")]
    JobClaimed { job_id: JobId, deadline_ms: u64, epoch_ms: u64 },

    /// First result batch moved the job to running.
    #[serde(rename = "job:started")]
    JobStarted { job_id: JobId, deadline_ms: u64 },

    #[serde(rename = "job:lease-extended")]
    JobLeaseExtended { job_id: JobId, deadline_ms: u64 },

    /// Lease lapsed; back to the queue with a back-off.
    #[serde(rename = "job:requeued")]
    JobRequeued { job_id: JobId, not_before_ms: u64 },

    #[serde(rename = "job:expired")]
    JobExpired { job_id: JobId, epoch_ms: u64 },

    #[serde(rename = "job:finalized")]
    JobFinalized { job_id: JobId, outcome: JobOutcome, epoch_ms: u64 },

    #[serde(rename = "job:canceled")]
    JobCanceled { job_id: JobId, epoch_ms: u64 },

    // -- results --
    /// One validated batch, persisted whole. `batch_seq` keys idempotent
    /// re-submission.
    #[serde(rename = "results:recorded")]
    ResultsRecorded { job_id: JobId, batch_seq: u32, findings: Vec<Finding>, epoch_ms: u64 },

    // -- config --
    #[serde(rename = "config:updated")]
    ConfigUpdated { version: u64, document: ConfigDocument, epoch_ms: u64 },
}

impl Event {
    /// Tag string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AgentRegistered { .. } => "agent:registered",
            Event::AgentRefreshed { .. } => "agent:refreshed",
            Event::AgentAuthorized { .. } => "agent:authorized",
            Event::AgentUpdated { .. } => "agent:updated",
            Event::AgentDeleted { .. } => "agent:deleted",
            Event::AgentPurged { .. } => "agent:purged",
            Event::AgentLiveness { .. } => "agent:liveness",
            Event::AgentConfigSeen { .. } => "agent:config-seen",
            Event::ScanCreated { .. } => "scan:created",
            Event::ScanCanceled { .. } => "scan:canceled",
            Event::ScanDeleted { .. } => "scan:deleted",
            Event::JobClaimed { .. } => "job:claimed",
            Event::JobStarted { .. } => "job:started",
            Event::JobLeaseExtended { .. } => "job:lease-extended",
            Event::JobRequeued { .. } => "job:requeued",
            Event::JobExpired { .. } => "job:expired",
            Event::JobFinalized { .. } => "job:finalized",
            Event::JobCanceled { .. } => "job:canceled",
            Event::ResultsRecorded { .. } => "results:recorded",
            Event::ConfigUpdated { .. } => "config:updated",
        }
    }

    /// One-line summary for event logging.
    pub fn log_summary(&self) -> String {
        let t = self.kind();
        match self {
            Event::AgentRegistered { agent_id, attrs, .. }
            | Event::AgentRefreshed { agent_id, attrs, .. } => {
                format!("{t} id={agent_id} host={}", attrs.hostname)
            }
            Event::AgentAuthorized { agent_id, authorized, .. } => {
                format!("{t} id={agent_id} authorized={authorized}")
            }
            Event::AgentUpdated { agent_id, .. }
            | Event::AgentDeleted { agent_id, .. }
            | Event::AgentPurged { agent_id }
            | Event::AgentConfigSeen { agent_id, .. } => format!("{t} id={agent_id}"),
            Event::AgentLiveness { agent_id, liveness, .. } => {
                format!("{t} id={agent_id} state={liveness}")
            }
            Event::ScanCreated { scan_id, jobs, .. } => {
                format!("{t} id={scan_id} jobs={}", jobs.len())
            }
            Event::ScanCanceled { scan_id, .. } | Event::ScanDeleted { scan_id } => {
                format!("{t} id={scan_id}")
            }
            Event::JobClaimed { job_id, .. }
            | Event::JobStarted { job_id, .. }
            | Event::JobLeaseExtended { job_id, .. }
            | Event::JobRequeued { job_id, .. }
            | Event::JobExpired { job_id, .. }
            | Event::JobCanceled { job_id, .. } => format!("{t} id={job_id}"),
            Event::JobFinalized { job_id, outcome, .. } => {
                let outcome = match outcome {
                    JobOutcome::Completed => "completed",
                    JobOutcome::Failed { .. } => "failed",
                };
                format!("{t} id={job_id} outcome={outcome}")
            }
            Event::ResultsRecorded { job_id, batch_seq, findings, .. } => {
                format!("{t} job={job_id} batch={batch_seq} findings={}", findings.len())
            }
            Event::ConfigUpdated { version, .. } => format!("{t} version={version}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
