// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry event handlers.

use vg_core::{AgentRecord, Event};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::AgentRegistered { agent_id, attrs, epoch_ms } => {
            // Guarded insert: replay after a concurrent registration keeps
            // the first record.
            state
                .agents
                .entry(*agent_id)
                .or_insert_with(|| AgentRecord::register(*agent_id, attrs.clone(), *epoch_ms));
        }

        Event::AgentRefreshed { agent_id, attrs, epoch_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.record_heartbeat(attrs.clone(), *epoch_ms);
            }
        }

        Event::AgentAuthorized { agent_id, authorized, epoch_ms } => {
            let window = state.config.merged(agent_id).liveness_window();
            if let Some(agent) = state.agents.get_mut(agent_id) {
                // Tombstoned agents cannot change authorization; ignore on
                // replay rather than fail.
                let _ = agent.set_authorized(*authorized, *epoch_ms, window);
            }
        }

        Event::AgentUpdated { agent_id, patch, epoch_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                // `authorized` travels via its own event so a heartbeat
                // refresh can never race admin intent away.
                if let Some(update) = patch.update_to_latest {
                    agent.update_to_latest = update;
                }
                agent.updated_at_ms = agent.updated_at_ms.max(*epoch_ms);
            }
        }

        Event::AgentDeleted { agent_id, epoch_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.tombstone(*epoch_ms);
            }
            // Outstanding jobs are canceled by their own events emitted in
            // the same transaction; the queue entry goes now.
            state.queues.remove(agent_id);
        }

        Event::AgentPurged { agent_id } => {
            state.agents.remove(agent_id);
        }

        Event::AgentLiveness { agent_id, liveness, .. } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.liveness = *liveness;
            }
        }

        Event::AgentConfigSeen { agent_id, version } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                // Monotonic: a delayed heartbeat never rolls the ack back.
                agent.config_version_seen = agent.config_version_seen.max(*version);
            }
        }

        _ => {}
    }
}
