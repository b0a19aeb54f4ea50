// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller configuration file (`vigild.toml`).
//!
//! Missing required keys fail loudly at startup with the offending key
//! named; nothing is defaulted into existence except the tuning knobs
//! under `[limits]`.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors worth stopping the process for.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("[tls] requires both `cert` and `key` unless `disabled = true`")]
    TlsMaterialMissing,

    #[error("[auth] {0} must not be empty")]
    EmptyCredential(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TlsConfig {
    /// Plaintext HTTP; meant for tests and TLS-terminating proxies only.
    pub disabled: bool,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthFileConfig {
    /// API keys accepted on the admin surface (`X-API-Key`).
    pub admin_keys: Vec<String>,
    /// Bearer tokens accepted on the agent surface.
    pub agent_tokens: Vec<String>,
    /// Optional bearer token for the scanner surface; absent means the
    /// surface is open (e.g. mTLS handled upstream).
    pub scanner_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// State directory: WAL, snapshots, lock file.
    pub dir: PathBuf,
}

/// Tuning knobs. Everything here has a sane default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LimitsConfig {
    /// Visibility timeout as a multiple of the agent's heartbeat interval.
    pub visibility_factor: u64,
    /// Maximum jobs handed out per poll.
    pub claim_batch: usize,
    /// Request body cap in bytes.
    pub max_body_bytes: usize,
    /// External request deadline in seconds.
    pub request_timeout_seconds: u64,
    /// Liveness monitor period in seconds.
    pub sweep_interval_seconds: u64,
    /// Dispatcher reclaimer period in seconds.
    pub reclaim_interval_seconds: u64,
    /// Snapshot/compaction period in seconds.
    pub checkpoint_interval_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            visibility_factor: 2,
            claim_batch: 4,
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
            sweep_interval_seconds: 60,
            reclaim_interval_seconds: 30,
            checkpoint_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    pub listen: ListenConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub auth: AuthFileConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Optional log file directory; stderr only when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl ControllerConfig {
    /// Load and validate. TOML's own "missing field" errors already name
    /// the key, so required keys fail loudly for free.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigFileError::Read { path: path.to_path_buf(), source })?;
        let config: ControllerConfig = toml::from_str(&raw)
            .map_err(|source| ConfigFileError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if !self.tls.disabled && (self.tls.cert.is_none() || self.tls.key.is_none()) {
            return Err(ConfigFileError::TlsMaterialMissing);
        }
        if self.auth.admin_keys.iter().any(String::is_empty) {
            return Err(ConfigFileError::EmptyCredential("admin_keys"));
        }
        if self.auth.agent_tokens.iter().any(String::is_empty) {
            return Err(ConfigFileError::EmptyCredential("agent_tokens"));
        }
        if self.auth.scanner_token.as_deref() == Some("") {
            return Err(ConfigFileError::EmptyCredential("scanner_token"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
