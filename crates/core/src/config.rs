// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned global agent configuration with per-agent overrides.
//!
//! The schema is strict: unknown keys fail deserialization, bounds are
//! enforced on every write, and the version only moves forward. Agents
//! learn about new versions through the `config_updated` heartbeat flag.

use crate::agent::LivenessWindow;
use crate::id::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Bounds violations on a config write. Surfaced as `VALIDATION_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("heartbeat.interval_in_seconds must be at least 60, got {0}")]
    IntervalTooSmall(u64),

    #[error("retry.attempts must be at least 1")]
    AttemptsZero,

    #[error("retry.delay_in_seconds must be at least 1")]
    DelayZero,

    #[error("executor.bulk_size must be at least 1")]
    BulkSizeZero,

    #[error("executor.scheduler_cron entry {expr:?} is not a valid cron expression")]
    InvalidCron { expr: String },
}

/// `heartbeat.*` options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatConfig {
    pub interval_in_seconds: u64,
    pub miss_until_inactive: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { interval_in_seconds: 600, miss_until_inactive: 1 }
    }
}

/// `retry.*` options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_in_seconds: u64,
    pub max_jitter_in_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 3, delay_in_seconds: 10, max_jitter_in_seconds: 5 }
    }
}

/// `executor.*` options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    pub bulk_size: u32,
    pub bulk_throttle_time_in_ms: u64,
    #[serde(default)]
    pub scheduler_cron: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { bulk_size: 100, bulk_throttle_time_in_ms: 100, scheduler_cron: Vec::new() }
    }
}

/// The full recognized option set served to agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AgentConfig {
    pub heartbeat: HeartbeatConfig,
    pub retry: RetryConfig,
    pub executor: ExecutorConfig,
}

impl AgentConfig {
    /// Enforce the documented bounds. Called on every write path; a stored
    /// config is always valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat.interval_in_seconds < 60 {
            return Err(ConfigError::IntervalTooSmall(self.heartbeat.interval_in_seconds));
        }
        if self.retry.attempts < 1 {
            return Err(ConfigError::AttemptsZero);
        }
        if self.retry.delay_in_seconds < 1 {
            return Err(ConfigError::DelayZero);
        }
        if self.executor.bulk_size < 1 {
            return Err(ConfigError::BulkSizeZero);
        }
        for expr in &self.executor.scheduler_cron {
            if cron::Schedule::from_str(expr).is_err() {
                return Err(ConfigError::InvalidCron { expr: expr.clone() });
            }
        }
        Ok(())
    }

    /// The liveness window this config implies.
    pub fn liveness_window(&self) -> LivenessWindow {
        LivenessWindow {
            interval_secs: self.heartbeat.interval_in_seconds,
            miss_until_inactive: self.heartbeat.miss_until_inactive,
        }
    }
}

/// Per-agent override: any recognized option, all optional, same strict
/// schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AgentConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<HeartbeatConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorConfig>,
}

impl AgentConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.heartbeat.is_none() && self.retry.is_none() && self.executor.is_none()
    }

    /// Apply this override on top of a base config.
    pub fn apply_to(&self, base: &AgentConfig) -> AgentConfig {
        AgentConfig {
            heartbeat: self.heartbeat.clone().unwrap_or_else(|| base.heartbeat.clone()),
            retry: self.retry.clone().unwrap_or_else(|| base.retry.clone()),
            executor: self.executor.clone().unwrap_or_else(|| base.executor.clone()),
        }
    }
}

/// One admin-authored config document: the global config plus per-agent
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    pub config: AgentConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<AgentId, AgentConfigPatch>,
}

impl ConfigDocument {
    /// Validate the global config and every override as merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        for patch in self.overrides.values() {
            patch.apply_to(&self.config).validate()?;
        }
        Ok(())
    }
}

/// The version-forward config store. Version 1 is the built-in default so
/// a fresh deployment always has a config to serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHistory {
    pub version: u64,
    pub document: ConfigDocument,
    pub updated_at_ms: u64,
}

impl Default for ConfigHistory {
    fn default() -> Self {
        Self { version: 1, document: ConfigDocument::default(), updated_at_ms: 0 }
    }
}

impl ConfigHistory {
    /// Install a new document; the version only moves forward.
    pub fn install(&mut self, document: ConfigDocument, epoch_ms: u64) -> u64 {
        self.version += 1;
        self.document = document;
        self.updated_at_ms = epoch_ms;
        self.version
    }

    /// The merged config snapshot one agent should run with.
    pub fn merged(&self, agent_id: &AgentId) -> AgentConfig {
        match self.document.overrides.get(agent_id) {
            Some(patch) => patch.apply_to(&self.document.config),
            None => self.document.config.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
