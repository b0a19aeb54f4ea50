// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner-surface (upstream manager) request/response bodies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vg_core::{AgentId, Finding, PreferenceSpec, ScanId, ScanStatus, ScanTargets, Threat};

/// `POST /scans` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScanRequest {
    pub vts: Vec<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    #[serde(default)]
    pub targets: ScanTargets,
    pub agent_ids: Vec<AgentId>,
    #[serde(default)]
    pub priority: i32,
}

/// 201 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScanResponse {
    pub scan_id: ScanId,
    pub status: ScanStatus,
    pub agents_assigned: u32,
}

/// `POST /scans/{id}` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanActionRequest {
    pub action: ScanAction,
}

/// Per-agent rollup inside the status response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRollup {
    pub agents_total: u32,
    pub agents_queued: u32,
    pub agents_running: u32,
    pub agents_completed: u32,
    pub agents_failed: u32,
}

/// `GET /scans/{id}/status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatusResponse {
    pub scan_id: ScanId,
    pub status: ScanStatus,
    pub progress: u8,
    #[serde(flatten)]
    pub rollup: AgentRollup,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

/// One result row as served to the upstream manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub result_id: String,
    pub agent_id: AgentId,
    /// Agent hostname snapshot taken at job creation.
    pub hostname: String,
    pub oid: String,
    pub host: String,
    pub port: String,
    pub severity: f64,
    pub threat: Threat,
    pub description: String,
    pub qod: u8,
    pub created_at_ms: u64,
}

impl From<&Finding> for ResultEntry {
    fn from(f: &Finding) -> Self {
        Self {
            result_id: f.result_id.to_string(),
            agent_id: f.agent_id,
            hostname: f.agent_hostname.clone(),
            oid: f.oid.clone(),
            host: f.host.clone(),
            port: f.port.clone(),
            severity: f.severity,
            threat: f.threat,
            description: f.description.clone(),
            qod: f.qod,
            created_at_ms: f.created_at_ms,
        }
    }
}

/// `GET /scans/{id}/results?range=a-b` response. `start`/`end` echo the
/// effective inclusive range served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPage {
    pub results: Vec<ResultEntry>,
    pub total: usize,
    pub start: usize,
    pub end: usize,
}

/// `GET /scans/preferences` response: the enumerated options catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencesResponse {
    pub preferences: &'static [PreferenceSpec],
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
