// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-surface request/response bodies.

use serde::{Deserialize, Serialize};
use vg_core::{AgentConfig, DeclaredAttrs, DraftFinding, JobId, JobOutcome, ScanId};

/// `POST /api/v1/agents/heartbeat` body. The agent re-declares everything
/// on every heartbeat; `agent_id` is a raw string validated server-side so
/// a malformed ID yields a proper validation error, not a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub agent_id: String,
    #[serde(flatten)]
    pub attrs: DeclaredAttrs,
    #[serde(default)]
    pub config_version_seen: u64,
}

/// Terminal vs. normal heartbeat acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    Accepted,
    /// The agent was deleted by an admin; this is the one terminal signal,
    /// after which the record is purged and the agent must cease.
    Deregistered,
}

/// Heartbeat acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: HeartbeatStatus,
    pub authorized: bool,
    pub config_updated: bool,
    pub next_heartbeat_in_seconds: u64,
}

/// One job handed to an agent by `GET /api/v1/agents/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandout {
    pub job_id: JobId,
    pub scan_id: ScanId,
    pub attempts: u32,
    /// Epoch ms when the visibility lease lapses.
    pub deadline_ms: u64,
    /// Execution config: VTs, preferences, targets.
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobHandout>,
}

/// `POST /api/v1/agents/jobs/{id}/results` body. `batch_sequence` makes
/// re-submission after a lost response idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSubmission {
    pub batch_sequence: u32,
    pub results: Vec<DraftFinding>,
}

/// 202 body for an accepted (or idempotently re-accepted) batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsAccepted {
    pub accepted: usize,
    pub batch_sequence: u32,
}

/// Acknowledgement carried by `POST /api/v1/agents/jobs/{id}/complete`:
/// terminal outcomes plus the lease-keepalive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AckOutcome {
    Completed,
    Failed {
        #[serde(default)]
        reason: String,
    },
    /// Not terminal: extends the visibility lease for long-running work.
    HeartbeatExtend,
}

impl AckOutcome {
    /// The terminal outcome, if this ack is one.
    pub fn as_job_outcome(&self) -> Option<JobOutcome> {
        match self {
            AckOutcome::Completed => Some(JobOutcome::Completed),
            AckOutcome::Failed { reason } => {
                Some(JobOutcome::Failed { reason: reason.clone() })
            }
            AckOutcome::HeartbeatExtend => None,
        }
    }
}

/// `POST /api/v1/agents/jobs/{id}/complete` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteRequest {
    #[serde(flatten)]
    pub outcome: AckOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Acknowledgement response: where the job landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub job_id: JobId,
    pub state: vg_core::JobStateKind,
}

/// `GET /api/v1/agents/config` response: the merged snapshot this agent
/// should run with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub version: u64,
    pub config: AgentConfig,
}

/// `GET /api/v1/agents/updates` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesResponse {
    pub update_to_latest: bool,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
