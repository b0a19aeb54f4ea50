// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use vg_core::test_support::{agent_uuid, declared_attrs};

fn register(store: &Store, n: u8, epoch_ms: u64) {
    store
        .transact::<_, std::convert::Infallible>(|_| {
            Ok((
                vec![Event::AgentRegistered {
                    agent_id: agent_uuid(n),
                    attrs: declared_attrs(&format!("host-{n}")),
                    epoch_ms,
                }],
                (),
            ))
        })
        .unwrap();
}

#[test]
fn transact_applies_events_read_your_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();

    register(&store, 1, 1_000);

    let hostname = store.read(|state| state.agents[&agent_uuid(1)].attrs.hostname.clone());
    assert_eq!(hostname, "host-1");
    assert_eq!(store.wal_seq(), 1);
}

#[test]
fn domain_error_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();

    let result: Result<(), TxError<&str>> = store.transact(|_| Err("rejected"));
    assert!(matches!(result, Err(TxError::Domain("rejected"))));
    assert_eq!(store.wal_seq(), 0);
    assert!(store.read(|state| state.agents.is_empty()));
}

#[test]
fn reopen_replays_the_wal() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        register(&store, 1, 1_000);
        register(&store, 2, 2_000);
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.read(|state| state.agents.len()), 2);
    assert_eq!(store.wal_seq(), 2);
}

#[test]
fn checkpoint_compacts_and_recovery_still_works() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        register(&store, 1, 1_000);
        let seq = store.checkpoint().unwrap();
        assert_eq!(seq, 1);
        // post-checkpoint write lands in the truncated WAL
        register(&store, 2, 2_000);
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.read(|state| state.agents.len()), 2);
    // appends continue after the checkpointed sequence
    register(&store, 3, 3_000);
    assert_eq!(store.wal_seq(), 3);
}

#[test]
fn second_store_on_same_dir_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let _store = Store::open(dir.path()).unwrap();
    assert!(matches!(Store::open(dir.path()), Err(StoreError::Locked(_))));
}
