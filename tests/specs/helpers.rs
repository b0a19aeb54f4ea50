// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture driving the full controller stack in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vg_core::test_support::agent_uuid;
use vg_core::{AgentId, FakeClock};
use vg_server::config::{AuthFileConfig, LimitsConfig};
use vg_server::{app, AppState, AuthKeys, Engine, Health, Limits, Store};

pub const AGENT_TOKEN: &str = "fleet-token";
pub const ADMIN_KEY: &str = "operator-key";

/// Agent `A` from the happy-path scenario.
pub fn agent_a() -> AgentId {
    agent_uuid(0x11)
}

pub struct Stack {
    router: Router,
    pub engine: Engine<FakeClock>,
    _dir: tempfile::TempDir,
}

pub fn stack() -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let engine = Engine::new(store, clock, Limits::default());
    let auth = Arc::new(AuthKeys::from_config(&AuthFileConfig {
        admin_keys: vec![ADMIN_KEY.to_string()],
        agent_tokens: vec![AGENT_TOKEN.to_string()],
        scanner_token: None,
    }));
    let health = Arc::new(Health::default());
    let state = AppState { engine: engine.clone(), auth, health };
    let router = app(state, &LimitsConfig::default());
    Stack { router, engine, _dir: dir }
}

impl Stack {
    pub fn advance_secs(&self, secs: u64) {
        self.engine.clock().advance_secs(secs);
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    // -- agent surface --

    pub async fn heartbeat(&self, agent: AgentId) -> (StatusCode, Value) {
        self.heartbeat_seen(agent, 0).await
    }

    pub async fn heartbeat_seen(&self, agent: AgentId, seen: u64) -> (StatusCode, Value) {
        let body = json!({
            "agent_id": agent.as_str(),
            "hostname": format!("host-{}", agent.short(2)),
            "os": "linux",
            "architecture": "x86_64",
            "version": "1.4.2",
            "ips": ["192.0.2.10"],
            "config_version_seen": seen,
        });
        let request = Request::post("/api/v1/agents/heartbeat")
            .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn agent_get(&self, agent: AgentId, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
            .header("X-Agent-ID", agent.as_str())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn poll_jobs(&self, agent: AgentId) -> (StatusCode, Value) {
        self.agent_get(agent, "/api/v1/agents/jobs").await
    }

    pub async fn submit_result(
        &self,
        agent: AgentId,
        job_id: &str,
        batch_sequence: u32,
    ) -> (StatusCode, Value) {
        let body = json!({
            "batch_sequence": batch_sequence,
            "results": [{
                "oid": "1.3.6.1.4.1.25623.1.0.10662",
                "host": "localhost",
                "port": "22/tcp",
                "severity": 5.0,
                "threat": "Medium",
                "description": "SSH service detected",
                "qod": 80,
            }],
        });
        let request = Request::post(format!("/api/v1/agents/jobs/{job_id}/results"))
            .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
            .header("X-Agent-ID", agent.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn complete(
        &self,
        agent: AgentId,
        job_id: &str,
        outcome: Value,
    ) -> (StatusCode, Value) {
        let request = Request::post(format!("/api/v1/agents/jobs/{job_id}/complete"))
            .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
            .header("X-Agent-ID", agent.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(outcome.to_string()))
            .unwrap();
        self.send(request).await
    }

    // -- admin surface --

    pub async fn authorize(&self, agent: AgentId) {
        let body = json!({ "agent_ids": [agent.as_str()], "authorized": true });
        let request = Request::patch("/api/v1/admin/agents")
            .header("X-API-Key", ADMIN_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, value) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "authorize failed: {value}");
        assert_eq!(value["results"][0]["ok"], true, "authorize failed: {value}");
    }

    pub async fn deauthorize(&self, agent: AgentId) {
        let body = json!({ "agent_ids": [agent.as_str()], "authorized": false });
        let request = Request::patch("/api/v1/admin/agents")
            .header("X-API-Key", ADMIN_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, value) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "deauthorize failed: {value}");
    }

    pub async fn admin_agents(&self, query: &str) -> (StatusCode, Value) {
        let request = Request::get(format!("/api/v1/admin/agents{query}"))
            .header("X-API-Key", ADMIN_KEY)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn put_config(&self, document: Value) -> (StatusCode, Value) {
        let request = Request::put("/api/v1/admin/scan-agent-config")
            .header("X-API-Key", ADMIN_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(document.to_string()))
            .unwrap();
        self.send(request).await
    }

    // -- scanner surface --

    pub async fn create_scan(&self, agents: &[AgentId]) -> String {
        let ids: Vec<&str> = agents.iter().map(|a| a.as_str()).collect();
        let body = json!({
            "vts": ["1.3.6.1.4.1.25623.1.0.10662"],
            "targets": { "hosts": ["localhost"] },
            "agent_ids": ids,
        });
        let request = Request::post("/scans")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, value) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "scan creation failed: {value}");
        assert_eq!(value["status"], "queued");
        value["scan_id"].as_str().unwrap().to_string()
    }

    pub async fn scan_status(&self, scan_id: &str) -> Value {
        let request =
            Request::get(format!("/scans/{scan_id}/status")).body(Body::empty()).unwrap();
        let (status, value) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "status failed: {value}");
        value
    }

    pub async fn scan_results(&self, scan_id: &str) -> Value {
        let request =
            Request::get(format!("/scans/{scan_id}/results")).body(Body::empty()).unwrap();
        let (status, value) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "results failed: {value}");
        value
    }
}
