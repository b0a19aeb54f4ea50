// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finding persistence handlers.

use vg_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    let Event::ResultsRecorded { job_id, batch_seq, findings, .. } = event else { return };

    let Some(job) = state.jobs.get_mut(job_id) else { return };
    // Duplicate submission of the same batch is a no-op: first write wins.
    if !job.recorded_batches.insert(*batch_seq) {
        return;
    }
    state.results.entry(job.scan_id).or_default().extend(findings.iter().cloned());
}
