// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use vg_core::test_support::{agent_uuid, declared_attrs};
use vg_core::Event;

fn populated_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::AgentRegistered {
        agent_id: agent_uuid(1),
        attrs: declared_attrs("snap-host"),
        epoch_ms: 1_000,
    });
    state
}

#[test]
fn save_then_load_roundtrips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snap");

    let snapshot = Snapshot::new(42, populated_state());
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state.agents.len(), 1);
    assert_eq!(loaded.state.agents[&agent_uuid(1)].attrs.hostname, "snap-host");
}

#[test]
fn load_missing_returns_none() {
    let dir = tempdir().unwrap();
    assert!(Snapshot::load(dir.path().join("absent.snap")).unwrap().is_none());
}

#[test]
fn save_rotates_previous_snapshot_to_backup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snap");

    Snapshot::new(1, MaterializedState::default()).save(&path).unwrap();
    Snapshot::new(2, MaterializedState::default()).save(&path).unwrap();

    assert_eq!(Snapshot::load(&path).unwrap().unwrap().seq, 2);
    let bak = path.with_extension("bak");
    assert!(bak.exists());
}

#[test]
fn backup_rotation_caps_out() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snap");

    for seq in 1..=6 {
        Snapshot::new(seq, MaterializedState::default()).save(&path).unwrap();
    }

    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());
}

#[test]
fn snapshot_content_is_compressed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snap");
    let snapshot = Snapshot::new(1, populated_state());
    snapshot.save(&path).unwrap();

    let raw = std::fs::read(&path).unwrap();
    // zstd magic number
    assert_eq!(&raw[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
}

#[test]
fn future_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snap");
    let mut snapshot = Snapshot::new(1, MaterializedState::default());
    snapshot.version = CURRENT_SNAPSHOT_VERSION + 1;
    snapshot.save(&path).unwrap();

    assert!(matches!(
        Snapshot::load(&path),
        Err(SnapshotError::UnsupportedVersion(_))
    ));
}
