// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for tests across the workspace.
//!
//! Enabled with the `test-support` feature so downstream crates can build
//! deterministic fixtures without repeating themselves.

use crate::agent::DeclaredAttrs;
use crate::finding::DraftFinding;
use crate::id::AgentId;
use crate::scan::{ScanSpec, ScanTargets};

/// Deterministic agent UUID: `nn111111-1111-4111-8111-111111111111`.
pub fn agent_uuid(n: u8) -> AgentId {
    let id = format!("{n:02x}111111-1111-4111-8111-111111111111");
    match AgentId::parse(&id) {
        Ok(id) => id,
        Err(_) => unreachable!("fixture UUID is well-formed"),
    }
}

/// Plausible declared attributes for a test agent.
pub fn declared_attrs(hostname: &str) -> DeclaredAttrs {
    DeclaredAttrs {
        hostname: hostname.to_string(),
        os: "linux".to_string(),
        architecture: "x86_64".to_string(),
        version: "1.4.2".to_string(),
        ips: vec!["192.0.2.10".to_string()],
    }
}

/// A minimal valid scan spec targeting the given agents.
pub fn scan_spec(agent_ids: Vec<AgentId>) -> ScanSpec {
    ScanSpec {
        vts: vec!["1.3.6.1.4.1.25623.1.0.10662".to_string()],
        preferences: Default::default(),
        targets: ScanTargets { hosts: vec!["localhost".to_string()], ports: None },
        agent_ids,
    }
}

/// The canonical happy-path finding draft from the SSH detection VT.
pub fn ssh_finding() -> DraftFinding {
    DraftFinding {
        oid: "1.3.6.1.4.1.25623.1.0.10662".to_string(),
        host: "localhost".to_string(),
        port: "22/tcp".to_string(),
        severity: 5.0,
        threat: crate::finding::Threat::Medium,
        description: "SSH service detected".to_string(),
        qod: 80,
    }
}

#[cfg(any(test, feature = "proptest"))]
pub mod strategies {
    //! Proptest strategies for the job state machine.

    use crate::job::{JobEvent, JobOutcome, JobState};
    use proptest::prelude::*;

    pub fn job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Queued),
            (1u64..10_000_000).prop_map(|deadline_ms| JobState::Assigned { deadline_ms }),
            (1u64..10_000_000).prop_map(|deadline_ms| JobState::Running { deadline_ms }),
            Just(JobState::Completed),
            ".{0,16}".prop_map(|reason| JobState::Failed { reason }),
            Just(JobState::Expired),
            Just(JobState::Canceled),
        ]
    }

    pub fn job_event() -> impl Strategy<Value = JobEvent> {
        prop_oneof![
            (1u64..10_000_000).prop_map(|deadline_ms| JobEvent::Claim { deadline_ms }),
            (1u64..10_000_000).prop_map(|deadline_ms| JobEvent::SubmitBatch { deadline_ms }),
            (1u64..10_000_000).prop_map(|deadline_ms| JobEvent::ExtendLease { deadline_ms }),
            Just(JobEvent::Finalize { outcome: JobOutcome::Completed }),
            ".{0,16}".prop_map(|reason| JobEvent::Finalize {
                outcome: JobOutcome::Failed { reason }
            }),
            Just(JobEvent::Requeue),
            Just(JobEvent::Expire),
            Just(JobEvent::Cancel),
        ]
    }
}
