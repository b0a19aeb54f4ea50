// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::test_helpers::{online_agent, test_engine};
use super::*;
use vg_core::{AgentConfigPatch, ConfigDocument, HeartbeatConfig, RetryConfig};

#[test]
fn default_config_is_version_1() {
    let (engine, _dir) = test_engine();
    let response = engine.get_config();
    assert_eq!(response.version, 1);
    assert_eq!(response.document.config.heartbeat.interval_in_seconds, 600);
}

#[test]
fn put_bumps_version_each_time() {
    let (engine, _dir) = test_engine();
    assert_eq!(engine.put_config(ConfigDocument::default()).unwrap().version, 2);
    assert_eq!(engine.put_config(ConfigDocument::default()).unwrap().version, 3);
    assert_eq!(engine.get_config().version, 3);
}

#[test]
fn interval_below_60_is_rejected() {
    let (engine, _dir) = test_engine();
    let mut document = ConfigDocument::default();
    document.config.heartbeat =
        HeartbeatConfig { interval_in_seconds: 59, miss_until_inactive: 1 };
    let err = engine.put_config(document).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(vg_core::ConfigError::IntervalTooSmall(59))
    ));
    // nothing installed
    assert_eq!(engine.get_config().version, 1);
}

#[test]
fn invalid_override_rejects_the_document() {
    let (engine, _dir) = test_engine();
    let a = online_agent(&engine, 1);
    let mut document = ConfigDocument::default();
    document.overrides.insert(
        a,
        AgentConfigPatch {
            retry: Some(RetryConfig { attempts: 0, delay_in_seconds: 1, max_jitter_in_seconds: 0 }),
            ..Default::default()
        },
    );
    assert!(matches!(
        engine.put_config(document),
        Err(EngineError::Config(vg_core::ConfigError::AttemptsZero))
    ));
}

#[test]
fn agent_config_merges_override() {
    let (engine, _dir) = test_engine();
    let a = online_agent(&engine, 1);
    let b = online_agent(&engine, 2);

    let mut document = ConfigDocument::default();
    document.overrides.insert(
        a,
        AgentConfigPatch {
            heartbeat: Some(HeartbeatConfig { interval_in_seconds: 120, miss_until_inactive: 2 }),
            ..Default::default()
        },
    );
    engine.put_config(document).unwrap();

    let for_a = engine.agent_config(a).unwrap();
    assert_eq!(for_a.version, 2);
    assert_eq!(for_a.config.heartbeat.interval_in_seconds, 120);

    let for_b = engine.agent_config(b).unwrap();
    assert_eq!(for_b.config.heartbeat.interval_in_seconds, 600);
}

#[test]
fn config_for_unknown_agent_is_not_found() {
    let (engine, _dir) = test_engine();
    let err = engine.agent_config(vg_core::test_support::agent_uuid(9)).unwrap_err();
    assert!(matches!(err, EngineError::AgentNotFound(_)));
}

#[test]
fn new_interval_reaches_heartbeat_response() {
    let (engine, _dir) = test_engine();
    let a = online_agent(&engine, 1);

    let mut document = ConfigDocument::default();
    document.config.heartbeat = HeartbeatConfig { interval_in_seconds: 300, miss_until_inactive: 1 };
    engine.put_config(document).unwrap();

    let response = engine
        .heartbeat(a.as_str(), vg_core::test_support::declared_attrs("host-1"), 1)
        .unwrap();
    assert!(response.config_updated);
    assert_eq!(response.next_heartbeat_in_seconds, 300);
}
