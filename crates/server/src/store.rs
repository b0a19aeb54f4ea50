// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable state with transactional mutation.
//!
//! One mutex guards the WAL and the materialized state together. A
//! [`transact`](Store::transact) closure validates against current state
//! and returns the events to commit; they are appended, flushed, and
//! applied before the lock is released, so every handler reads its own
//! writes and job transitions are linearizable. The only I/O inside the
//! critical section is the buffered WAL append — never an await point.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;
use vg_core::Event;
use vg_storage::{MaterializedState, Snapshot, SnapshotError, Wal, WalError};

/// Failures opening or checkpointing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data dir {0} is already in use by another controller")]
    Locked(PathBuf),

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// A transaction failed either in the domain closure or in storage.
#[derive(Debug, Error)]
pub enum TxError<E> {
    #[error(transparent)]
    Domain(E),

    #[error("storage failure: {0}")]
    Storage(#[from] WalError),
}

struct StoreInner {
    wal: Wal,
    state: MaterializedState,
}

/// Shared handle to the controller's persistent state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
    snapshot_path: PathBuf,
    // Advisory lock held for the life of the store.
    _lock: Arc<File>,
}

impl Store {
    /// Open the store in `data_dir`: take the advisory lock, load the
    /// newest snapshot, replay the WAL tail, rebuild indices and re-derive
    /// scan counters.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let lock_path = data_dir.join("vigild.lock");
        let lock = File::create(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| StoreError::Locked(data_dir.to_path_buf()))?;

        let snapshot_path = data_dir.join("state.snap");
        let mut state = MaterializedState::default();
        let mut replay_from = 0;
        if let Some(snapshot) = Snapshot::load(&snapshot_path)? {
            tracing::info!(seq = snapshot.seq, "loaded snapshot");
            state = snapshot.state;
            replay_from = snapshot.seq;
        }

        let mut wal = Wal::open(data_dir.join("events.wal"), replay_from)?;
        let tail = wal.entries_after(replay_from)?;
        let replayed = tail.len();
        for entry in tail {
            state.apply_event(&entry.event);
        }
        state.rebuild_indices();
        tracing::info!(replayed, seq = wal.write_seq(), "store recovered");

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner { wal, state })),
            snapshot_path,
            _lock: Arc::new(lock),
        })
    }

    /// Run a read-only closure against current state.
    pub fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Run a mutation: the closure validates against current state and
    /// returns `(events, value)`. Events are appended, flushed, and applied
    /// atomically with respect to every other reader and writer.
    pub fn transact<R, E>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(Vec<Event>, R), E>,
    ) -> Result<R, TxError<E>> {
        let mut inner = self.inner.lock();
        let (events, value) = f(&inner.state).map_err(TxError::Domain)?;
        for event in &events {
            inner.wal.append(event)?;
            tracing::debug!(event = %event.log_summary(), "committed");
        }
        if !events.is_empty() {
            inner.wal.flush()?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(value)
    }

    /// Write a snapshot of the current state and drop the WAL prefix it
    /// covers.
    pub fn checkpoint(&self) -> Result<u64, StoreError> {
        let (snapshot, seq) = {
            let inner = self.inner.lock();
            let seq = inner.wal.write_seq();
            (Snapshot::new(seq, inner.state.clone()), seq)
        };
        // Serialization and compression happen outside the lock; the WAL
        // prefix is immutable once the sequence is captured.
        snapshot.save(&self.snapshot_path)?;
        self.inner.lock().wal.truncate_before(seq)?;
        tracing::info!(seq, "checkpoint written");
        Ok(seq)
    }

    /// Highest committed WAL sequence.
    pub fn wal_seq(&self) -> u64 {
        self.inner.lock().wal.write_seq()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
