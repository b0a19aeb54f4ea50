// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry record and the liveness state machine.
//!
//! Heartbeats are the only liveness signal — agents sit behind NAT and the
//! controller never probes. The sweep demotes agents that stop reporting;
//! any heartbeat from an authorized agent restores `online`.

use crate::id::AgentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds of heartbeat silence after which an `offline` agent is
/// demoted to `inactive` (24 hours, measured from the last heartbeat).
pub const INACTIVE_AFTER_MS: u64 = 24 * 60 * 60 * 1000;

/// Liveness of an agent as observed through its heartbeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// Known but not yet authorized; never demoted by the sweep.
    Pending,
    /// Authorized and heartbeating within its window.
    Online,
    /// Missed its heartbeat window.
    Offline,
    /// Silent for more than 24 hours.
    Inactive,
    /// Soft-deleted by an admin; receives one terminal signal, then purged.
    Tombstoned,
}

crate::simple_display! {
    Liveness {
        Pending => "pending",
        Online => "online",
        Offline => "offline",
        Inactive => "inactive",
        Tombstoned => "tombstoned",
    }
}

/// Heartbeat window parameters taken from the agent's merged config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessWindow {
    pub interval_secs: u64,
    pub miss_until_inactive: u64,
}

impl LivenessWindow {
    /// Silence threshold before `online → offline`:
    /// `interval * (1 + miss_until_inactive)`.
    pub fn offline_after_ms(&self) -> u64 {
        self.interval_secs * (1 + self.miss_until_inactive) * 1000
    }
}

/// Attributes an agent re-declares on every heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredAttrs {
    pub hostname: String,
    pub os: String,
    pub architecture: String,
    pub version: String,
    #[serde(default)]
    pub ips: Vec<String>,
}

/// Admin-authored partial update applied to one or more agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_to_latest: Option<bool>,
}

/// State-machine violations on a single agent record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("agent {0} is deregistered")]
    Deregistered(AgentId),
}

/// One registered agent.
///
/// The record is created on first heartbeat (unauthorized, `pending`) and
/// owned exclusively by the controller; agents only re-declare attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub attrs: DeclaredAttrs,
    /// Admin-controlled gate for all job delivery. Never written by the
    /// heartbeat path.
    pub authorized: bool,
    pub liveness: Liveness,
    /// Wall-clock epoch ms of the newest heartbeat. Monotonic non-decreasing;
    /// conflicting concurrent writes keep the later wall clock.
    pub last_heartbeat_ms: u64,
    /// Newest global config version the agent has acknowledged.
    pub config_version_seen: u64,
    /// Admin-driven self-update flag served on `/agents/updates`.
    pub update_to_latest: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl AgentRecord {
    /// Create a record for a first-contact agent: unauthorized, `pending`.
    pub fn register(agent_id: AgentId, attrs: DeclaredAttrs, epoch_ms: u64) -> Self {
        Self {
            agent_id,
            attrs,
            authorized: false,
            liveness: Liveness::Pending,
            last_heartbeat_ms: epoch_ms,
            config_version_seen: 0,
            update_to_latest: false,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
        }
    }

    pub fn is_tombstoned(&self) -> bool {
        self.liveness == Liveness::Tombstoned
    }

    /// Record a heartbeat: re-declare attributes, bump `last_heartbeat_ms`
    /// (monotonic — a stale wall clock never moves it backwards), and restore
    /// liveness. Never touches `authorized`.
    pub fn record_heartbeat(&mut self, attrs: DeclaredAttrs, epoch_ms: u64) {
        if self.is_tombstoned() {
            return;
        }
        self.attrs = attrs;
        self.last_heartbeat_ms = self.last_heartbeat_ms.max(epoch_ms);
        self.updated_at_ms = self.updated_at_ms.max(epoch_ms);
        self.liveness = if self.authorized { Liveness::Online } else { Liveness::Pending };
    }

    /// Flip the admin authorization gate.
    ///
    /// Granting authorization promotes a recently-seen agent straight to
    /// `online`; one that is already past its window starts `offline`.
    /// Revoking drops it back to `pending`.
    pub fn set_authorized(
        &mut self,
        authorized: bool,
        now_ms: u64,
        window: LivenessWindow,
    ) -> Result<(), AgentError> {
        if self.is_tombstoned() {
            return Err(AgentError::Deregistered(self.agent_id));
        }
        self.authorized = authorized;
        self.updated_at_ms = self.updated_at_ms.max(now_ms);
        self.liveness = if !authorized {
            Liveness::Pending
        } else if now_ms.saturating_sub(self.last_heartbeat_ms) <= window.offline_after_ms() {
            Liveness::Online
        } else {
            Liveness::Offline
        };
        Ok(())
    }

    /// Soft-delete. Terminal; the agent gets one `deregistered` signal on its
    /// next contact and is purged.
    pub fn tombstone(&mut self, now_ms: u64) {
        self.liveness = Liveness::Tombstoned;
        self.updated_at_ms = self.updated_at_ms.max(now_ms);
    }

    /// One liveness-sweep step. Returns the new state when a transition
    /// fires, `None` for a no-op — running twice with no elapsed time yields
    /// no changes.
    pub fn sweep(&self, now_ms: u64, window: LivenessWindow) -> Option<Liveness> {
        let silent_ms = now_ms.saturating_sub(self.last_heartbeat_ms);
        match self.liveness {
            Liveness::Online if silent_ms > window.offline_after_ms() => Some(Liveness::Offline),
            Liveness::Offline if silent_ms > INACTIVE_AFTER_MS => Some(Liveness::Inactive),
            _ => None,
        }
    }

    /// Whether the dispatcher may hand this agent work right now.
    pub fn eligible_for_jobs(&self) -> bool {
        self.authorized && self.liveness == Liveness::Online
    }
}

crate::builder! {
    pub struct AgentRecordBuilder => AgentRecord {
        set {
            agent_id: AgentId = AgentId::generate(),
            attrs: DeclaredAttrs = DeclaredAttrs {
                hostname: "host-1".to_string(),
                os: "linux".to_string(),
                architecture: "x86_64".to_string(),
                version: "1.0.0".to_string(),
                ips: Vec::new(),
            },
            authorized: bool = false,
            liveness: Liveness = Liveness::Pending,
            last_heartbeat_ms: u64 = 1_000_000,
            config_version_seen: u64 = 0,
            update_to_latest: bool = false,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
