// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn window() -> LivenessWindow {
    LivenessWindow { interval_secs: 600, miss_until_inactive: 1 }
}

fn attrs() -> DeclaredAttrs {
    DeclaredAttrs {
        hostname: "edge-7".to_string(),
        os: "linux".to_string(),
        architecture: "aarch64".to_string(),
        version: "2.1.0".to_string(),
        ips: vec!["10.0.0.7".to_string()],
    }
}

#[test]
fn register_starts_pending_unauthorized() {
    let rec = AgentRecord::register(AgentId::generate(), attrs(), 5_000);
    assert!(!rec.authorized);
    assert_eq!(rec.liveness, Liveness::Pending);
    assert_eq!(rec.last_heartbeat_ms, 5_000);
    assert_eq!(rec.config_version_seen, 0);
}

#[test]
fn heartbeat_is_monotonic() {
    let mut rec = AgentRecord::builder().last_heartbeat_ms(10_000_u64).build();
    rec.record_heartbeat(attrs(), 9_000);
    assert_eq!(rec.last_heartbeat_ms, 10_000);
    rec.record_heartbeat(attrs(), 11_000);
    assert_eq!(rec.last_heartbeat_ms, 11_000);
}

#[test]
fn heartbeat_redeclares_attributes() {
    let mut rec = AgentRecord::builder().build();
    let mut new_attrs = attrs();
    new_attrs.version = "2.2.0".to_string();
    rec.record_heartbeat(new_attrs.clone(), 2_000_000);
    assert_eq!(rec.attrs, new_attrs);
}

#[test]
fn heartbeat_never_authorizes() {
    let mut rec = AgentRecord::builder().build();
    rec.record_heartbeat(attrs(), 2_000_000);
    assert!(!rec.authorized);
    assert_eq!(rec.liveness, Liveness::Pending);
}

#[test]
fn heartbeat_restores_authorized_agent_to_online() {
    let mut rec =
        AgentRecord::builder().authorized(true).liveness(Liveness::Offline).build();
    rec.record_heartbeat(attrs(), 2_000_000);
    assert_eq!(rec.liveness, Liveness::Online);
}

#[test]
fn heartbeat_restores_inactive_agent_to_online() {
    let mut rec =
        AgentRecord::builder().authorized(true).liveness(Liveness::Inactive).build();
    rec.record_heartbeat(attrs(), 2_000_000);
    assert_eq!(rec.liveness, Liveness::Online);
}

#[test]
fn heartbeat_ignored_on_tombstoned() {
    let mut rec = AgentRecord::builder().liveness(Liveness::Tombstoned).build();
    let before = rec.clone();
    rec.record_heartbeat(attrs(), 9_000_000);
    assert_eq!(rec, before);
}

#[test]
fn authorize_recent_agent_goes_online() {
    let mut rec = AgentRecord::builder().last_heartbeat_ms(1_000_000_u64).build();
    rec.set_authorized(true, 1_010_000, window()).unwrap();
    assert!(rec.authorized);
    assert_eq!(rec.liveness, Liveness::Online);
}

#[test]
fn authorize_stale_agent_goes_offline() {
    let mut rec = AgentRecord::builder().last_heartbeat_ms(0_u64).build();
    // 1201s of silence is past the 600 * (1 + 1) window
    rec.set_authorized(true, 1_201_000, window()).unwrap();
    assert_eq!(rec.liveness, Liveness::Offline);
}

#[test]
fn deauthorize_returns_to_pending() {
    let mut rec =
        AgentRecord::builder().authorized(true).liveness(Liveness::Online).build();
    rec.set_authorized(false, 1_100_000, window()).unwrap();
    assert!(!rec.authorized);
    assert_eq!(rec.liveness, Liveness::Pending);
}

#[test]
fn authorize_tombstoned_is_rejected() {
    let mut rec = AgentRecord::builder().liveness(Liveness::Tombstoned).build();
    let err = rec.set_authorized(true, 1_100_000, window()).unwrap_err();
    assert!(matches!(err, AgentError::Deregistered(_)));
}

#[test]
fn sweep_demotes_online_after_window() {
    let rec = AgentRecord::builder()
        .authorized(true)
        .liveness(Liveness::Online)
        .last_heartbeat_ms(1_000_000_u64)
        .build();
    // exactly at the window boundary: still online
    assert_eq!(rec.sweep(1_000_000 + 1_200_000, window()), None);
    // past it: offline
    assert_eq!(rec.sweep(1_000_000 + 1_200_001, window()), Some(Liveness::Offline));
}

#[test]
fn sweep_demotes_offline_to_inactive_after_24h_of_silence() {
    let rec = AgentRecord::builder()
        .authorized(true)
        .liveness(Liveness::Offline)
        .last_heartbeat_ms(1_000_000_u64)
        .build();
    assert_eq!(rec.sweep(1_000_000 + INACTIVE_AFTER_MS, window()), None);
    assert_eq!(
        rec.sweep(1_000_000 + INACTIVE_AFTER_MS + 1, window()),
        Some(Liveness::Inactive)
    );
}

#[yare::parameterized(
    pending    = { Liveness::Pending },
    inactive   = { Liveness::Inactive },
    tombstoned = { Liveness::Tombstoned },
)]
fn sweep_never_demotes(liveness: Liveness) {
    let rec = AgentRecord::builder().liveness(liveness).last_heartbeat_ms(0_u64).build();
    assert_eq!(rec.sweep(u64::MAX / 2, window()), None);
}

#[test]
fn sweep_is_idempotent_with_no_elapsed_time() {
    let mut rec = AgentRecord::builder()
        .authorized(true)
        .liveness(Liveness::Online)
        .last_heartbeat_ms(1_000_000_u64)
        .build();
    let now = 1_000_000 + 1_300_000;
    let first = rec.sweep(now, window());
    assert_eq!(first, Some(Liveness::Offline));
    rec.liveness = Liveness::Offline;
    assert_eq!(rec.sweep(now, window()), None);
}

#[test]
fn eligibility_requires_authorized_and_online() {
    let mut rec =
        AgentRecord::builder().authorized(true).liveness(Liveness::Online).build();
    assert!(rec.eligible_for_jobs());
    rec.liveness = Liveness::Offline;
    assert!(!rec.eligible_for_jobs());
    rec.liveness = Liveness::Online;
    rec.authorized = false;
    assert!(!rec.eligible_for_jobs());
}

#[test]
fn liveness_display_names() {
    assert_eq!(Liveness::Pending.to_string(), "pending");
    assert_eq!(Liveness::Tombstoned.to_string(), "tombstoned");
}

#[test]
fn offline_window_arithmetic() {
    let w = LivenessWindow { interval_secs: 60, miss_until_inactive: 0 };
    assert_eq!(w.offline_after_ms(), 60_000);
    let w = LivenessWindow { interval_secs: 600, miss_until_inactive: 2 };
    assert_eq!(w.offline_after_ms(), 1_800_000);
}
