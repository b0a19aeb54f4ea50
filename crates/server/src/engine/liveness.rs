// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness monitor: a periodic sweep demoting silent agents.
//!
//! Heartbeats are the sole signal — agents sit behind NAT and cannot be
//! probed. Only real transitions are written, so a sweep with no elapsed
//! time writes nothing and the sweep is safe to run concurrently with
//! request handlers (per-agent decisions, one short critical section).

use vg_core::{Clock, Event};

use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

impl<C: Clock> Engine<C> {
    /// One sweep over all agents. Returns the number of transitions.
    ///
    /// The agent set is snapshotted first; each transition is then its own
    /// short critical section, re-checked against current state, so the
    /// sweep never blocks request handlers for more than one row.
    pub fn liveness_sweep(&self) -> Result<usize, EngineError> {
        let now = self.clock.epoch_ms();
        let candidates: Vec<vg_core::AgentId> =
            self.store.read(|state| state.agents.keys().copied().collect());

        let mut moved = 0;
        for agent_id in candidates {
            moved += self.store.transact::<_, EngineError>(|state| {
                let Some(rec) = state.agents.get(&agent_id) else {
                    return Ok((Vec::new(), 0));
                };
                if rec.is_tombstoned() {
                    return Ok((Vec::new(), 0));
                }
                let window = state.config.merged(&agent_id).liveness_window();
                match rec.sweep(now, window) {
                    Some(next) => Ok((
                        vec![Event::AgentLiveness { agent_id, liveness: next, epoch_ms: now }],
                        1,
                    )),
                    None => Ok((Vec::new(), 0)),
                }
            })?;
        }
        if moved > 0 {
            tracing::info!(moved, "liveness sweep");
        }
        Ok(moved)
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
