// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config history handlers.

use vg_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    let Event::ConfigUpdated { version, document, epoch_ms } = event else { return };

    // Only-forward versioning: replaying an old write never rolls back.
    if *version <= state.config.version {
        return;
    }
    state.config.version = *version;
    state.config.document = document.clone();
    state.config.updated_at_ms = *epoch_ms;
}
