// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan entity: one upstream-authored assessment fanned out to N agents.
//!
//! Progress and termination are pure counter arithmetic over job rows; the
//! counters are re-derived from those rows after a restart, so the scan
//! never stores anything it could not reconstruct.

use crate::id::{AgentId, ScanId};
use crate::validate::{self, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Aggregate status of a scan. Terminal states freeze the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Canceled,
}

crate::simple_display! {
    ScanStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Canceled => "canceled",
    }
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Canceled)
    }
}

/// Target descriptor carried opaquely into each job's config. The
/// controller validates shape, never connects anywhere itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTargets {
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
}

/// What the upstream manager asks for: which VTs, with which scanner
/// preferences, against which targets, on which agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSpec {
    pub vts: Vec<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    #[serde(default)]
    pub targets: ScanTargets,
    pub agent_ids: Vec<AgentId>,
}

impl ScanSpec {
    /// Validate everything that can be checked without the registry:
    /// OID format, preference keys against the enumerated catalog, port
    /// ranges, and non-empty VT/agent sets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.vts.is_empty() {
            return Err(ValidationError::Empty("vts"));
        }
        if self.agent_ids.is_empty() {
            return Err(ValidationError::Empty("agent_ids"));
        }
        for oid in &self.vts {
            validate::check_oid(oid)?;
        }
        for key in self.preferences.keys() {
            validate::check_preference(key)?;
        }
        if let Some(ports) = &self.targets.ports {
            validate::check_port_list(ports)?;
        }
        Ok(())
    }
}

/// Violations of the scan lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("scan {0} is already terminal")]
    AlreadyTerminal(ScanId),
}

/// One scan row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub scan_id: ScanId,
    pub spec: ScanSpec,
    pub status: ScanStatus,
    pub total_jobs: u32,
    pub terminal_jobs: u32,
    pub succeeded_jobs: u32,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl Scan {
    /// Create a freshly materialized scan with its job count. A scan with
    /// zero jobs can never make progress and fails immediately.
    pub fn new(scan_id: ScanId, spec: ScanSpec, total_jobs: u32, epoch_ms: u64) -> Self {
        let status = if total_jobs == 0 { ScanStatus::Failed } else { ScanStatus::Queued };
        Self {
            scan_id,
            spec,
            status,
            total_jobs,
            terminal_jobs: 0,
            succeeded_jobs: 0,
            created_at_ms: epoch_ms,
            started_at_ms: None,
            completed_at_ms: if total_jobs == 0 { Some(epoch_ms) } else { None },
        }
    }

    /// Progress percent, rounded down.
    pub fn progress(&self) -> u8 {
        if self.total_jobs == 0 {
            return if self.status.is_terminal() { 100 } else { 0 };
        }
        ((u64::from(self.terminal_jobs) * 100) / u64::from(self.total_jobs)) as u8
    }

    /// First job handed out: `queued → running`. Later claims are no-ops,
    /// as is anything after a terminal transition (a canceled scan stays
    /// canceled while its leases drain).
    pub fn note_dispatch(&mut self, epoch_ms: u64) {
        if self.status == ScanStatus::Queued {
            self.status = ScanStatus::Running;
            self.started_at_ms = Some(epoch_ms);
        }
    }

    /// One job reached a terminal state. Bumps counters and, when the last
    /// job lands, settles the scan: `completed` if at least one job
    /// succeeded (partial reports are still useful), else `failed`.
    pub fn note_job_terminal(&mut self, succeeded: bool, epoch_ms: u64) {
        self.terminal_jobs = (self.terminal_jobs + 1).min(self.total_jobs);
        if succeeded {
            self.succeeded_jobs = (self.succeeded_jobs + 1).min(self.total_jobs);
        }
        if self.terminal_jobs == self.total_jobs && !self.status.is_terminal() {
            self.status =
                if self.succeeded_jobs > 0 { ScanStatus::Completed } else { ScanStatus::Failed };
            self.completed_at_ms = Some(epoch_ms);
        }
    }

    /// Cancel: terminal immediately, even while delivered jobs drain
    /// through their visibility leases.
    pub fn cancel(&mut self, epoch_ms: u64) -> Result<(), ScanError> {
        if self.status.is_terminal() {
            return Err(ScanError::AlreadyTerminal(self.scan_id));
        }
        self.status = ScanStatus::Canceled;
        self.completed_at_ms = Some(epoch_ms);
        Ok(())
    }
}

crate::builder! {
    pub struct ScanBuilder => Scan {
        set {
            scan_id: ScanId = ScanId::generate(),
            spec: ScanSpec = ScanSpec::default(),
            status: ScanStatus = ScanStatus::Queued,
            total_jobs: u32 = 1,
            terminal_jobs: u32 = 0,
            succeeded_jobs: u32 = 0,
            created_at_ms: u64 = 1_000_000,
        }
        option {
            started_at_ms: u64 = None,
            completed_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
