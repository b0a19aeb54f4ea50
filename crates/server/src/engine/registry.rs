// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry: heartbeats, admin operations, listing.

use std::cmp::Reverse;

use vg_core::{AgentId, AgentPatch, Clock, DeclaredAttrs, Event, Liveness};
use vg_wire::{
    AgentEntry, AgentPage, AgentQuery, BulkResult, HeartbeatResponse, HeartbeatStatus,
    UpdatesResponse,
};

use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

impl<C: Clock> Engine<C> {
    /// `register_or_refresh`: upsert on every heartbeat.
    ///
    /// A new agent is created unauthorized and `pending`. An existing agent
    /// re-declares its attributes and bumps `last_heartbeat`. Authorization
    /// is never touched here — that is admin intent, protected by having
    /// its own event. A tombstoned agent receives the one terminal
    /// `deregistered` signal and its record is purged in the same
    /// transaction.
    pub fn heartbeat(
        &self,
        raw_agent_id: &str,
        attrs: DeclaredAttrs,
        config_version_seen: u64,
    ) -> Result<HeartbeatResponse, EngineError> {
        let agent_id = AgentId::parse(raw_agent_id)?;
        let now = self.clock.epoch_ms();

        let response = self.store.transact::<_, EngineError>(|state| {
            let current_version = state.config.version;
            let merged = state.config.merged(&agent_id);
            let interval = merged.heartbeat.interval_in_seconds;

            match state.agents.get(&agent_id) {
                None => Ok((
                    vec![Event::AgentRegistered { agent_id, attrs: attrs.clone(), epoch_ms: now }],
                    HeartbeatResponse {
                        status: HeartbeatStatus::Accepted,
                        authorized: false,
                        config_updated: config_version_seen < current_version,
                        next_heartbeat_in_seconds: interval,
                    },
                )),
                Some(rec) if rec.is_tombstoned() => Ok((
                    vec![Event::AgentPurged { agent_id }],
                    HeartbeatResponse {
                        status: HeartbeatStatus::Deregistered,
                        authorized: false,
                        config_updated: false,
                        next_heartbeat_in_seconds: interval,
                    },
                )),
                Some(rec) => {
                    let mut events =
                        vec![Event::AgentRefreshed { agent_id, attrs: attrs.clone(), epoch_ms: now }];
                    // Cap the ack at the version that actually exists.
                    let seen = config_version_seen.min(current_version);
                    if seen > rec.config_version_seen {
                        events.push(Event::AgentConfigSeen { agent_id, version: seen });
                    }
                    let effective_seen = rec.config_version_seen.max(seen);
                    Ok((
                        events,
                        HeartbeatResponse {
                            status: HeartbeatStatus::Accepted,
                            authorized: rec.authorized,
                            config_updated: effective_seen < current_version,
                            next_heartbeat_in_seconds: interval,
                        },
                    ))
                }
            }
        })?;
        Ok(response)
    }

    /// Admin listing with filtering and stable pagination ordered
    /// `(last_heartbeat desc, agent_id)`. Tombstoned agents only show up
    /// when asked for explicitly.
    pub fn list_agents(&self, query: &AgentQuery) -> AgentPage {
        self.store.read(|state| {
            let mut matched: Vec<&vg_core::AgentRecord> = state
                .agents
                .values()
                .filter(|rec| match query.liveness {
                    Some(liveness) => rec.liveness == liveness,
                    None => rec.liveness != Liveness::Tombstoned,
                })
                .filter(|rec| query.authorized.is_none_or(|a| rec.authorized == a))
                .filter(|rec| {
                    query
                        .hostname_prefix
                        .as_deref()
                        .is_none_or(|prefix| rec.attrs.hostname.starts_with(prefix))
                })
                .collect();
            matched.sort_by_key(|rec| (Reverse(rec.last_heartbeat_ms), rec.agent_id));

            let total = matched.len();
            let agents = matched
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .map(AgentEntry::from)
                .collect();
            AgentPage { agents, total, offset: query.offset, limit: query.limit }
        })
    }

    /// Bulk partial update. Per-agent outcomes; nothing is silently
    /// skipped. Authorizing an already-authorized agent is a no-op.
    pub fn bulk_patch(
        &self,
        agent_ids: &[AgentId],
        patch: &AgentPatch,
    ) -> Result<Vec<BulkResult>, EngineError> {
        let now = self.clock.epoch_ms();
        let results = self.store.transact::<_, std::convert::Infallible>(|state| {
            let mut events = Vec::new();
            let mut results = Vec::new();
            for &agent_id in agent_ids {
                let outcome = match state.agents.get(&agent_id) {
                    None => Err(EngineError::AgentNotFound(agent_id).to_string()),
                    Some(rec) if rec.is_tombstoned() => {
                        Err(EngineError::AgentDeregistered(agent_id).to_string())
                    }
                    Some(rec) => {
                        if let Some(authorized) = patch.authorized {
                            if rec.authorized != authorized {
                                events.push(Event::AgentAuthorized {
                                    agent_id,
                                    authorized,
                                    epoch_ms: now,
                                });
                            }
                        }
                        if patch.update_to_latest.is_some() {
                            events.push(Event::AgentUpdated {
                                agent_id,
                                patch: AgentPatch {
                                    authorized: None,
                                    update_to_latest: patch.update_to_latest,
                                },
                                epoch_ms: now,
                            });
                        }
                        Ok(())
                    }
                };
                results.push(match outcome {
                    Ok(()) => BulkResult { agent_id, ok: true, error: None },
                    Err(error) => BulkResult { agent_id, ok: false, error: Some(error) },
                });
            }
            Ok((events, results))
        })?;
        Ok(results)
    }

    /// Bulk soft-delete: tombstone each agent and cancel its outstanding
    /// jobs. Deleting an already-deleted agent is a no-op success.
    pub fn bulk_delete(&self, agent_ids: &[AgentId]) -> Result<Vec<BulkResult>, EngineError> {
        let now = self.clock.epoch_ms();
        let results = self.store.transact::<_, std::convert::Infallible>(|state| {
            let mut events = Vec::new();
            let mut results = Vec::new();
            for &agent_id in agent_ids {
                match state.agents.get(&agent_id) {
                    None => results.push(BulkResult {
                        agent_id,
                        ok: false,
                        error: Some(EngineError::AgentNotFound(agent_id).to_string()),
                    }),
                    Some(rec) => {
                        if !rec.is_tombstoned() {
                            events.push(Event::AgentDeleted { agent_id, epoch_ms: now });
                            for job in state.jobs.values() {
                                if job.agent_id == agent_id && !job.is_terminal() {
                                    events.push(Event::JobCanceled {
                                        job_id: job.job_id,
                                        epoch_ms: now,
                                    });
                                }
                            }
                        }
                        results.push(BulkResult { agent_id, ok: true, error: None });
                    }
                }
            }
            Ok((events, results))
        })?;
        Ok(results)
    }

    /// `GET /api/v1/agents/updates`: the admin-driven self-update flag.
    pub fn agent_updates(&self, agent_id: AgentId) -> Result<UpdatesResponse, EngineError> {
        self.store.read(|state| match state.agents.get(&agent_id) {
            None => Err(EngineError::AgentNotFound(agent_id)),
            Some(rec) if rec.is_tombstoned() => Err(EngineError::AgentDeregistered(agent_id)),
            Some(rec) => Ok(UpdatesResponse { update_to_latest: rec.update_to_latest }),
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
