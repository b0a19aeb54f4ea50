// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan lifecycle event handlers.

use vg_core::{Event, Scan};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ScanCreated { scan_id, spec, jobs, epoch_ms } => {
            // One fact materializes the scan and every job row; replay can
            // never observe a half-created scan.
            if state.scans.contains_key(scan_id) {
                return;
            }
            state
                .scans
                .insert(*scan_id, Scan::new(*scan_id, spec.clone(), jobs.len() as u32, *epoch_ms));
            for job in jobs {
                state.enqueue_seq = state.enqueue_seq.max(job.enqueue_seq + 1);
                if !state.jobs.contains_key(&job.job_id) {
                    state.jobs.insert(job.job_id, job.clone());
                    state.enqueue(job.job_id);
                }
            }
        }

        Event::ScanCanceled { scan_id, epoch_ms } => {
            if let Some(scan) = state.scans.get_mut(scan_id) {
                // Queued jobs are canceled by their own events in the same
                // transaction; delivered jobs drain through their leases.
                let _ = scan.cancel(*epoch_ms);
            }
        }

        Event::ScanDeleted { scan_id } => {
            state.scans.remove(scan_id);
            state.results.remove(scan_id);
            let doomed: Vec<_> = state
                .jobs
                .values()
                .filter(|j| j.scan_id == *scan_id)
                .map(|j| (j.agent_id, j.job_id))
                .collect();
            for (agent_id, job_id) in doomed {
                state.dequeue(&agent_id, &job_id);
                state.jobs.remove(&job_id);
            }
        }

        _ => {}
    }
}
