// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use vg_core::test_support::{agent_uuid, declared_attrs, scan_spec, ssh_finding};
use vg_core::{
    AgentId, Event, Finding, Job, JobId, JobOutcome, JobState, Liveness, ResultId, ScanId,
};

mod agents;
mod lifecycle;
mod replay;

/// Register and authorize one agent at `epoch_ms`.
fn seeded_agent(state: &mut MaterializedState, n: u8, epoch_ms: u64) -> AgentId {
    let agent_id = agent_uuid(n);
    state.apply_event(&Event::AgentRegistered {
        agent_id,
        attrs: declared_attrs(&format!("host-{n}")),
        epoch_ms,
    });
    state.apply_event(&Event::AgentAuthorized { agent_id, authorized: true, epoch_ms });
    agent_id
}

/// Materialize a scan with one queued job per given agent.
fn seeded_scan(
    state: &mut MaterializedState,
    agents: &[AgentId],
    epoch_ms: u64,
) -> (ScanId, Vec<JobId>) {
    let scan_id = ScanId::generate();
    let mut jobs = Vec::new();
    for (i, agent_id) in agents.iter().enumerate() {
        jobs.push(
            Job::builder()
                .scan_id(scan_id)
                .agent_id(*agent_id)
                .enqueue_seq(state.enqueue_seq + i as u64)
                .created_at_ms(epoch_ms)
                .hostname(format!("host-{i}"))
                .build(),
        );
    }
    let job_ids: Vec<JobId> = jobs.iter().map(|j| j.job_id).collect();
    state.apply_event(&Event::ScanCreated {
        scan_id,
        spec: scan_spec(agents.to_vec()),
        jobs,
        epoch_ms,
    });
    (scan_id, job_ids)
}

fn finding_for(scan_id: ScanId, agent_id: AgentId, job_id: JobId) -> Finding {
    let draft = ssh_finding();
    Finding {
        result_id: ResultId::generate(),
        scan_id,
        agent_id,
        job_id,
        agent_hostname: "host-1".to_string(),
        oid: draft.oid,
        host: draft.host,
        port: draft.port,
        severity: draft.severity,
        threat: draft.threat,
        description: draft.description,
        qod: draft.qod,
        created_at_ms: 2_000,
    }
}
