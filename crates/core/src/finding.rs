// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Findings: immutable result rows submitted by agents.

use crate::id::{AgentId, JobId, ResultId, ScanId};
use crate::validate::{self, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threat label attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threat {
    Log,
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Threat {
        Log => "Log",
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
}

/// Batch-level rejection. Malformed batches are rejected whole; nothing in
/// a bad batch is persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FindingError {
    #[error("finding {index} in batch: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("empty result batch")]
    EmptyBatch,
}

/// One vulnerability finding as submitted by an agent.
///
/// The scan/agent/job linkage is stamped by the ingestor from the job row,
/// never taken from the submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub result_id: ResultId,
    pub scan_id: ScanId,
    pub agent_id: AgentId,
    pub job_id: JobId,
    /// Agent hostname snapshot taken at job creation.
    pub agent_hostname: String,
    pub oid: String,
    pub host: String,
    pub port: String,
    pub severity: f64,
    pub threat: Threat,
    #[serde(default)]
    pub description: String,
    /// Quality of detection, 0–100.
    #[serde(default)]
    pub qod: u8,
    pub created_at_ms: u64,
}

/// The agent-authored portion of a finding, before the ingestor stamps
/// identity and linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftFinding {
    pub oid: String,
    pub host: String,
    pub port: String,
    pub severity: f64,
    pub threat: Threat,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub qod: u8,
}

impl DraftFinding {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::check_oid(&self.oid)?;
        if self.host.is_empty() {
            return Err(ValidationError::Empty("host"));
        }
        validate::check_port(&self.port)?;
        validate::check_severity(self.severity)?;
        Ok(())
    }
}

/// Validate a whole batch, all-or-nothing.
pub fn validate_batch(batch: &[DraftFinding]) -> Result<(), FindingError> {
    if batch.is_empty() {
        return Err(FindingError::EmptyBatch);
    }
    for (index, draft) in batch.iter().enumerate() {
        draft.validate().map_err(|source| FindingError::Invalid { index, source })?;
    }
    Ok(())
}

crate::builder! {
    pub struct DraftFindingBuilder => DraftFinding {
        into {
            oid: String = "1.3.6.1.4.1.25623.1.0.10662",
            host: String = "localhost",
            port: String = "22/tcp",
            description: String = "",
        }
        set {
            severity: f64 = 5.0,
            threat: Threat = Threat::Medium,
            qod: u8 = 70,
        }
    }
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
