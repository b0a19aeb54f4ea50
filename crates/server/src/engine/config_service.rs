// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned agent configuration service.

use vg_core::{AgentId, Clock, ConfigDocument, Event};
use vg_wire::{ConfigGetResponse, ConfigResponse, PutConfigResponse};

use super::{Engine, EngineError};

#[cfg(test)]
use super::test_helpers;

impl<C: Clock> Engine<C> {
    /// Current global config document with its version.
    pub fn get_config(&self) -> ConfigGetResponse {
        self.store.read(|state| ConfigGetResponse {
            version: state.config.version,
            document: state.config.document.clone(),
        })
    }

    /// Install a new document. Bounds are enforced on the global config
    /// and on every override as merged; the version only moves forward.
    pub fn put_config(&self, document: ConfigDocument) -> Result<PutConfigResponse, EngineError> {
        let now = self.clock.epoch_ms();
        document.validate()?;
        let version = self.store.transact::<_, EngineError>(|state| {
            let version = state.config.version + 1;
            let events =
                vec![Event::ConfigUpdated { version, document: document.clone(), epoch_ms: now }];
            Ok((events, version))
        })?;
        tracing::info!(version, "agent config updated");
        Ok(PutConfigResponse { version })
    }

    /// The merged snapshot one agent should run with.
    pub fn agent_config(&self, agent_id: AgentId) -> Result<ConfigResponse, EngineError> {
        self.store.read(|state| match state.agents.get(&agent_id) {
            None => Err(EngineError::AgentNotFound(agent_id)),
            Some(rec) if rec.is_tombstoned() => Err(EngineError::AgentDeregistered(agent_id)),
            Some(_) => Ok(ConfigResponse {
                version: state.config.version,
                config: state.config.merged(&agent_id),
            }),
        })
    }
}

#[cfg(test)]
#[path = "config_service_tests.rs"]
mod tests;
