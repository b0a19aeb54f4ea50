// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job row and state machine.
//!
//! One job is one agent's share of a scan, pinned to that agent at creation.
//! Transitions are pure `state × event → Result<state>` so the machine stays
//! auditable; terminal states freeze the row and reject every event.

use crate::id::{AgentId, JobId, ScanId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Milliseconds a queued job may wait unclaimed before it expires (24 h).
/// Agents reconnecting after long absence receive no stale work.
pub const UNCLAIMED_EXPIRY_MS: u64 = 24 * 60 * 60 * 1000;

/// Lifecycle state of a job. `Assigned` and `Running` carry the visibility
/// lease deadline; once it passes, the reclaimer may requeue or expire the
/// job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Assigned { deadline_ms: u64 },
    Running { deadline_ms: u64 },
    Completed,
    Failed { reason: String },
    Expired,
    Canceled,
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Assigned { .. } => "assigned",
        Running { .. } => "running",
        Completed => "completed",
        Failed { .. } => "failed",
        Expired => "expired",
        Canceled => "canceled",
    }
}

/// Tag-only variant of [`JobState`] for wire DTOs and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStateKind {
    Queued,
    Assigned,
    Running,
    Completed,
    Failed,
    Expired,
    Canceled,
}

impl From<&JobState> for JobStateKind {
    fn from(s: &JobState) -> Self {
        match s {
            JobState::Queued => JobStateKind::Queued,
            JobState::Assigned { .. } => JobStateKind::Assigned,
            JobState::Running { .. } => JobStateKind::Running,
            JobState::Completed => JobStateKind::Completed,
            JobState::Failed { .. } => JobStateKind::Failed,
            JobState::Expired => JobStateKind::Expired,
            JobState::Canceled => JobStateKind::Canceled,
        }
    }
}

crate::simple_display! {
    JobStateKind {
        Queued => "queued",
        Assigned => "assigned",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Expired => "expired",
        Canceled => "canceled",
    }
}

/// Terminal outcome reported through `finalize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Failed {
        #[serde(default)]
        reason: String,
    },
}

/// Events driving the job state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// Atomic handout to the pinned agent with a fresh visibility lease.
    Claim { deadline_ms: u64 },
    /// A result batch arrived; first one moves `assigned → running`, all of
    /// them refresh the lease.
    SubmitBatch { deadline_ms: u64 },
    /// Explicit lease extension (`heartbeat_extend` ack).
    ExtendLease { deadline_ms: u64 },
    /// Terminal acknowledgement from the agent.
    Finalize { outcome: JobOutcome },
    /// Lease expired; hand the job back to the queue.
    Requeue,
    /// Delivery attempts exhausted or unclaimed too long.
    Expire,
    /// Scan canceled or agent deleted.
    Cancel,
}

/// Illegal transition attempts. `AlreadyTerminal` maps to a 409 upstream so
/// late results are rejected loudly, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job is already terminal ({state})")]
    AlreadyTerminal { state: JobStateKind },

    #[error("event not allowed in state {state}: {detail}")]
    InvalidEvent { state: JobStateKind, detail: &'static str },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed
                | JobState::Failed { .. }
                | JobState::Expired
                | JobState::Canceled
        )
    }

    /// The lease deadline, when one is active.
    pub fn deadline_ms(&self) -> Option<u64> {
        match self {
            JobState::Assigned { deadline_ms } | JobState::Running { deadline_ms } => {
                Some(*deadline_ms)
            }
            _ => None,
        }
    }

    /// Apply an event, yielding the next state. Pure; the caller persists.
    pub fn apply(&self, event: &JobEvent) -> Result<JobState, TransitionError> {
        let kind = JobStateKind::from(self);
        if self.is_terminal() {
            return Err(TransitionError::AlreadyTerminal { state: kind });
        }
        match (self, event) {
            (JobState::Queued, JobEvent::Claim { deadline_ms }) => {
                Ok(JobState::Assigned { deadline_ms: *deadline_ms })
            }
            (JobState::Queued, JobEvent::Expire) => Ok(JobState::Expired),
            (JobState::Queued, JobEvent::Cancel) => Ok(JobState::Canceled),
            (JobState::Queued, _) => Err(TransitionError::InvalidEvent {
                state: kind,
                detail: "job has not been claimed",
            }),

            (
                JobState::Assigned { .. } | JobState::Running { .. },
                JobEvent::SubmitBatch { deadline_ms },
            ) => Ok(JobState::Running { deadline_ms: *deadline_ms }),

            (
                JobState::Assigned { .. } | JobState::Running { .. },
                JobEvent::ExtendLease { deadline_ms },
            ) => match self {
                JobState::Assigned { .. } => {
                    Ok(JobState::Assigned { deadline_ms: *deadline_ms })
                }
                _ => Ok(JobState::Running { deadline_ms: *deadline_ms }),
            },

            // A completed finalize requires at least one submitted batch,
            // which is exactly what Running encodes.
            (JobState::Assigned { .. }, JobEvent::Finalize { outcome: JobOutcome::Completed }) => {
                Err(TransitionError::InvalidEvent {
                    state: kind,
                    detail: "completed finalize requires at least one result batch",
                })
            }
            (
                JobState::Assigned { .. } | JobState::Running { .. },
                JobEvent::Finalize { outcome },
            ) => Ok(match outcome {
                JobOutcome::Completed => JobState::Completed,
                JobOutcome::Failed { reason } => JobState::Failed { reason: reason.clone() },
            }),

            (JobState::Assigned { .. } | JobState::Running { .. }, JobEvent::Requeue) => {
                Ok(JobState::Queued)
            }
            (JobState::Assigned { .. } | JobState::Running { .. }, JobEvent::Expire) => {
                Ok(JobState::Expired)
            }
            (JobState::Assigned { .. } | JobState::Running { .. }, JobEvent::Cancel) => {
                Ok(JobState::Canceled)
            }

            (JobState::Assigned { .. } | JobState::Running { .. }, JobEvent::Claim { .. }) => {
                Err(TransitionError::InvalidEvent {
                    state: kind,
                    detail: "job is already leased",
                })
            }

            // Terminal states were rejected above.
            (terminal, _) => Err(TransitionError::AlreadyTerminal {
                state: JobStateKind::from(terminal),
            }),
        }
    }
}

/// One agent's share of a scan. Exactly one row exists per (scan, agent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub scan_id: ScanId,
    pub agent_id: AgentId,
    pub state: JobState,
    /// Current delivery attempt, starting at 1. Redelivery after lease
    /// expiry keeps the same job_id and bumps this.
    pub attempts: u32,
    pub priority: i32,
    /// Global enqueue sequence; with priority it fixes the FIFO order.
    pub enqueue_seq: u64,
    /// Earliest epoch ms at which claim may hand the job out again
    /// (requeue back-off). Zero means immediately ready.
    pub not_before_ms: u64,
    /// Agent hostname snapshot taken at job creation, echoed on results.
    pub hostname: String,
    /// Opaque execution config handed to the agent (VTs, preferences,
    /// targets).
    pub config: serde_json::Value,
    /// Result batch sequences already persisted, for idempotent submission.
    #[serde(default)]
    pub recorded_batches: BTreeSet<u32>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether claim may hand this job out at `now_ms`.
    pub fn ready_at(&self, now_ms: u64) -> bool {
        matches!(self.state, JobState::Queued) && self.not_before_ms <= now_ms
    }

    /// Whether the active lease has lapsed at `now_ms`.
    pub fn lease_expired(&self, now_ms: u64) -> bool {
        self.state.deadline_ms().is_some_and(|d| d < now_ms)
    }

    /// Whether the job has sat unclaimed past the 24 h expiry.
    pub fn unclaimed_expired(&self, now_ms: u64) -> bool {
        matches!(self.state, JobState::Queued)
            && now_ms.saturating_sub(self.created_at_ms) > UNCLAIMED_EXPIRY_MS
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            hostname: String = "host-1",
        }
        set {
            job_id: JobId = JobId::generate(),
            scan_id: ScanId = ScanId::generate(),
            agent_id: AgentId = AgentId::generate(),
            state: JobState = JobState::Queued,
            attempts: u32 = 1,
            priority: i32 = 0,
            enqueue_seq: u64 = 0,
            not_before_ms: u64 = 0,
            config: serde_json::Value = serde_json::Value::Null,
            recorded_batches: BTreeSet<u32> = BTreeSet::new(),
            created_at_ms: u64 = 1_000_000,
        }
        option {
            assigned_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
