// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vg-core: Domain model for the Vigil scan controller.
//!
//! Pure types and state machines — no I/O. Everything here is exercised by
//! the storage replay path and the server services.

pub mod macros;

pub mod agent;
pub mod clock;
pub mod config;
pub mod event;
pub mod finding;
pub mod id;
pub mod job;
pub mod scan;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AgentError, AgentPatch, AgentRecord, DeclaredAttrs, Liveness, LivenessWindow};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    AgentConfig, AgentConfigPatch, ConfigDocument, ConfigError, ConfigHistory, ExecutorConfig,
    HeartbeatConfig, RetryConfig,
};
pub use event::Event;
pub use finding::{validate_batch, DraftFinding, Finding, FindingError, Threat};
pub use id::{AgentId, JobId, ParseIdError, ResultId, ScanId};
pub use job::{Job, JobEvent, JobOutcome, JobState, JobStateKind, TransitionError};
pub use scan::{Scan, ScanError, ScanSpec, ScanStatus, ScanTargets};
pub use validate::{PreferenceSpec, ValidationError, PREFERENCE_CATALOG};
