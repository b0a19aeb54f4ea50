// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-surface request/response bodies.

use serde::{Deserialize, Serialize};
use vg_core::{AgentId, AgentPatch, AgentRecord, ConfigDocument, Liveness};

/// Query parameters for `GET /api/v1/admin/agents`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentQuery {
    #[serde(default)]
    pub liveness: Option<Liveness>,
    #[serde(default)]
    pub authorized: Option<bool>,
    #[serde(default)]
    pub hostname_prefix: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for AgentQuery {
    fn default() -> Self {
        Self {
            liveness: None,
            authorized: None,
            hostname_prefix: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

/// One agent row in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub agent_id: AgentId,
    pub hostname: String,
    pub os: String,
    pub architecture: String,
    pub version: String,
    pub ips: Vec<String>,
    pub authorized: bool,
    pub liveness: Liveness,
    pub last_heartbeat_ms: u64,
    pub config_version_seen: u64,
    pub update_to_latest: bool,
    pub created_at_ms: u64,
}

impl From<&AgentRecord> for AgentEntry {
    fn from(rec: &AgentRecord) -> Self {
        Self {
            agent_id: rec.agent_id,
            hostname: rec.attrs.hostname.clone(),
            os: rec.attrs.os.clone(),
            architecture: rec.attrs.architecture.clone(),
            version: rec.attrs.version.clone(),
            ips: rec.attrs.ips.clone(),
            authorized: rec.authorized,
            liveness: rec.liveness,
            last_heartbeat_ms: rec.last_heartbeat_ms,
            config_version_seen: rec.config_version_seen,
            update_to_latest: rec.update_to_latest,
            created_at_ms: rec.created_at_ms,
        }
    }
}

/// Stable-scroll page ordered `(last_heartbeat desc, agent_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPage {
    pub agents: Vec<AgentEntry>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// `PATCH /api/v1/admin/agents` body: one patch applied to many agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPatchRequest {
    pub agent_ids: Vec<AgentId>,
    #[serde(flatten)]
    pub patch: AgentPatch,
}

/// Per-agent outcome of a bulk operation. Partial success is reported,
/// never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub agent_id: AgentId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPatchResponse {
    pub results: Vec<BulkResult>,
}

/// `POST /api/v1/admin/agents/delete` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub agent_ids: Vec<AgentId>,
}

/// `GET /api/v1/admin/scan-agent-config` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGetResponse {
    pub version: u64,
    #[serde(flatten)]
    pub document: ConfigDocument,
}

/// `PUT /api/v1/admin/scan-agent-config` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutConfigResponse {
    pub version: u64,
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
