// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_are_valid() {
    assert!(AgentConfig::default().validate().is_ok());
}

#[test]
fn interval_below_60_rejected() {
    let mut cfg = AgentConfig::default();
    cfg.heartbeat.interval_in_seconds = 59;
    assert_eq!(cfg.validate(), Err(ConfigError::IntervalTooSmall(59)));
}

#[test]
fn interval_of_exactly_60_accepted() {
    let mut cfg = AgentConfig::default();
    cfg.heartbeat.interval_in_seconds = 60;
    assert!(cfg.validate().is_ok());
}

#[test]
fn zero_attempts_rejected() {
    let mut cfg = AgentConfig::default();
    cfg.retry.attempts = 0;
    assert_eq!(cfg.validate(), Err(ConfigError::AttemptsZero));
}

#[test]
fn zero_delay_rejected() {
    let mut cfg = AgentConfig::default();
    cfg.retry.delay_in_seconds = 0;
    assert_eq!(cfg.validate(), Err(ConfigError::DelayZero));
}

#[test]
fn zero_bulk_size_rejected() {
    let mut cfg = AgentConfig::default();
    cfg.executor.bulk_size = 0;
    assert_eq!(cfg.validate(), Err(ConfigError::BulkSizeZero));
}

#[test]
fn valid_cron_accepted() {
    let mut cfg = AgentConfig::default();
    cfg.executor.scheduler_cron = vec!["0 0 2 * * *".to_string()];
    assert!(cfg.validate().is_ok());
}

#[test]
fn invalid_cron_rejected() {
    let mut cfg = AgentConfig::default();
    cfg.executor.scheduler_cron = vec!["every tuesday".to_string()];
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCron { .. })));
}

#[test]
fn unknown_keys_rejected_by_schema() {
    let json = r#"{"heartbeat":{"interval_in_seconds":600,"miss_until_inactive":1,"color":"red"}}"#;
    let result: Result<AgentConfig, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

#[test]
fn unknown_top_level_section_rejected() {
    let json = r#"{"telemetry":{"enabled":true}}"#;
    let result: Result<AgentConfig, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

#[test]
fn partial_document_fills_defaults() {
    let json = r#"{"retry":{"attempts":5,"delay_in_seconds":2,"max_jitter_in_seconds":0}}"#;
    let cfg: AgentConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.retry.attempts, 5);
    assert_eq!(cfg.heartbeat, HeartbeatConfig::default());
}

#[test]
fn patch_applies_only_named_sections() {
    let base = AgentConfig::default();
    let patch = AgentConfigPatch {
        heartbeat: Some(HeartbeatConfig { interval_in_seconds: 120, miss_until_inactive: 2 }),
        ..Default::default()
    };
    let merged = patch.apply_to(&base);
    assert_eq!(merged.heartbeat.interval_in_seconds, 120);
    assert_eq!(merged.retry, base.retry);
    assert_eq!(merged.executor, base.executor);
}

#[test]
fn document_validation_covers_merged_overrides() {
    let mut doc = ConfigDocument::default();
    doc.overrides.insert(
        AgentId::generate(),
        AgentConfigPatch {
            heartbeat: Some(HeartbeatConfig { interval_in_seconds: 10, miss_until_inactive: 0 }),
            ..Default::default()
        },
    );
    assert_eq!(doc.validate(), Err(ConfigError::IntervalTooSmall(10)));
}

#[test]
fn history_starts_at_version_1() {
    let history = ConfigHistory::default();
    assert_eq!(history.version, 1);
}

#[test]
fn install_bumps_version_forward() {
    let mut history = ConfigHistory::default();
    let v = history.install(ConfigDocument::default(), 5_000);
    assert_eq!(v, 2);
    let v = history.install(ConfigDocument::default(), 6_000);
    assert_eq!(v, 3);
    assert_eq!(history.updated_at_ms, 6_000);
}

#[test]
fn merged_prefers_override() {
    let agent = AgentId::generate();
    let mut history = ConfigHistory::default();
    let mut doc = ConfigDocument::default();
    doc.overrides.insert(
        agent,
        AgentConfigPatch {
            retry: Some(RetryConfig { attempts: 9, delay_in_seconds: 1, max_jitter_in_seconds: 0 }),
            ..Default::default()
        },
    );
    history.install(doc, 5_000);
    assert_eq!(history.merged(&agent).retry.attempts, 9);
    assert_eq!(history.merged(&AgentId::generate()).retry.attempts, 3);
}

#[test]
fn liveness_window_reflects_heartbeat_config() {
    let cfg = AgentConfig::default();
    let w = cfg.liveness_window();
    assert_eq!(w.interval_secs, 600);
    assert_eq!(w.miss_until_inactive, 1);
}
