// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination engine behind the three HTTP surfaces.
//!
//! One [`Engine`] value bundles the store, the clock, and the tuning
//! limits; each service lives in its own module as an `impl` block:
//!
//! - [`registry`] — agent lifecycle, heartbeats, admin operations
//! - [`coordinator`] — scan fan-out, status rollup, results, cancel
//! - [`dispatcher`] — claim with visibility leases, reclaim sweep
//! - [`ingestor`] — result batches and finalization
//! - [`liveness`] — heartbeat-driven demotion sweep
//! - [`config_service`] — versioned agent config

mod config_service;
mod coordinator;
mod dispatcher;
mod ingestor;
mod liveness;
mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::LimitsConfig;
use crate::store::{Store, TxError};
use thiserror::Error;
use vg_core::{
    AgentId, Clock, ConfigError, FindingError, JobId, JobStateKind, ParseIdError, ScanId,
    ValidationError,
};
use vg_storage::WalError;

/// Engine tuning, derived from `[limits]` in the config file.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Visibility timeout as a multiple of the agent heartbeat interval.
    pub visibility_factor: u64,
    /// Maximum jobs handed out per poll.
    pub claim_batch: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { visibility_factor: 2, claim_batch: 4 }
    }
}

impl From<&LimitsConfig> for Limits {
    fn from(cfg: &LimitsConfig) -> Self {
        Self { visibility_factor: cfg.visibility_factor, claim_batch: cfg.claim_batch }
    }
}

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct Engine<C: Clock> {
    pub(crate) store: Store,
    pub(crate) clock: C,
    pub(crate) limits: Limits,
}

impl<C: Clock> Engine<C> {
    pub fn new(store: Store, clock: C, limits: Limits) -> Self {
        Self { store, clock, limits }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Domain failures, one variant per distinct API-visible condition.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid agent id: {0}")]
    InvalidAgentId(#[from] ParseIdError),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("agent {0} is deregistered")]
    AgentDeregistered(AgentId),

    #[error("scan {0} not found")]
    ScanNotFound(ScanId),

    #[error("scan {0} is already terminal")]
    ScanAlreadyTerminal(ScanId),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("job {0} belongs to another agent")]
    WrongAgent(JobId),

    #[error("job {job_id} is already finalized ({state})")]
    AlreadyFinalized { job_id: JobId, state: JobStateKind },

    #[error("job {job_id} is not active ({state})")]
    JobNotActive { job_id: JobId, state: JobStateKind },

    #[error("completed finalize requires at least one result batch")]
    CompletionWithoutResults,

    #[error("unknown target agent {0}")]
    UnknownTargetAgent(AgentId),

    #[error("target agent {0} is not authorized")]
    TargetNotAuthorized(AgentId),

    #[error("target agent {0} is deregistered")]
    TargetDeregistered(AgentId),

    #[error("duplicate target agent {0}")]
    DuplicateTargetAgent(AgentId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] FindingError),

    #[error("storage failure: {0}")]
    Storage(#[from] WalError),
}

impl From<TxError<EngineError>> for EngineError {
    fn from(err: TxError<EngineError>) -> Self {
        match err {
            TxError::Domain(domain) => domain,
            TxError::Storage(wal) => EngineError::Storage(wal),
        }
    }
}

impl From<TxError<std::convert::Infallible>> for EngineError {
    fn from(err: TxError<std::convert::Infallible>) -> Self {
        match err {
            TxError::Domain(never) => match never {},
            TxError::Storage(wal) => EngineError::Storage(wal),
        }
    }
}
