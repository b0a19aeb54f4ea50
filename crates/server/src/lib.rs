// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vg-server: the Vigil controller process.
//!
//! Brokers between a trusted upstream manager and an untrusted polling
//! agent fleet: agent registry with liveness, scan fan-out, per-agent job
//! queues with visibility leases, result aggregation, versioned agent
//! config, all behind three authenticated HTTP surfaces.

pub mod auth;
pub mod config;
pub mod engine;
pub mod http;
pub mod runtime;
pub mod store;
pub mod tls;

pub use auth::AuthKeys;
pub use config::ControllerConfig;
pub use engine::{Engine, EngineError, Limits};
pub use http::{app, AppState, Health};
pub use store::{Store, StoreError, TxError};
