// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vg-storage: durability for the Vigil controller.
//!
//! Every mutation is a [`vg_core::Event`] appended to the WAL; the
//! [`MaterializedState`] is what replaying those events yields. Snapshots
//! bound replay time; anything not in the snapshot is recovered from the
//! WAL tail. In-memory indices (queues, scan counters) are rebuilt from
//! the rows on load, never trusted from disk.

mod snapshot;
mod state;
mod wal;

pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
