// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process bootstrap: store recovery, background workers, the listener,
//! and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use vg_core::{Clock, SystemClock};

use crate::auth::AuthKeys;
use crate::config::ControllerConfig;
use crate::engine::{Engine, EngineError, Limits};
use crate::http::{app, AppState, Health};
use crate::store::{Store, StoreError};
use crate::tls::TlsError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("listener failed: {0}")]
    Listener(#[from] std::io::Error),

    #[error("[tls] cert/key required when TLS is enabled")]
    MissingTlsMaterial,
}

/// One periodic engine sweep, driven until cancellation.
///
/// Sweeps are safe to run concurrently with request handlers; a failed
/// sweep is logged and retried on the next tick, never fatal.
async fn sweep_loop<F>(name: &'static str, period: Duration, cancel: CancellationToken, f: F)
where
    F: Fn() -> Result<usize, EngineError>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(worker = name, "stopped");
                return;
            }
            _ = ticker.tick() => {
                if let Err(err) = f() {
                    tracing::warn!(worker = name, error = %err, "sweep failed");
                }
            }
        }
    }
}

/// Spawn the liveness monitor, the dispatcher reclaimer, and the
/// checkpointer. Returns the token that stops them.
pub fn spawn_workers<C: Clock>(
    engine: Engine<C>,
    config: &ControllerConfig,
) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let engine = engine.clone();
        let cancel = cancel.clone();
        let period = Duration::from_secs(config.limits.sweep_interval_seconds);
        tokio::spawn(async move {
            sweep_loop("liveness", period, cancel, move || engine.liveness_sweep()).await;
        });
    }
    {
        let engine = engine.clone();
        let cancel = cancel.clone();
        let period = Duration::from_secs(config.limits.reclaim_interval_seconds);
        tokio::spawn(async move {
            sweep_loop("reclaimer", period, cancel, move || engine.reclaim_sweep()).await;
        });
    }
    {
        let store = engine.store().clone();
        let cancel = cancel.clone();
        let period = Duration::from_secs(config.limits.checkpoint_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately; skip it so startup does
            // not checkpoint an empty store
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if let Err(err) = store.checkpoint() {
                            tracing::warn!(error = %err, "checkpoint failed");
                        }
                    }
                }
            }
        });
    }

    cancel
}

/// Run the controller until SIGINT/SIGTERM.
pub async fn run(config: ControllerConfig) -> Result<(), ServerError> {
    let store = Store::open(&config.data.dir)?;
    let engine = Engine::new(store, SystemClock, Limits::from(&config.limits));
    let auth = Arc::new(AuthKeys::from_config(&config.auth));
    let health = Arc::new(Health::default());

    let state = AppState {
        engine: engine.clone(),
        auth,
        health: Arc::clone(&health),
    };
    let router = app(state, &config.limits);

    let cancel = spawn_workers(engine, &config);
    health.set_started();
    health.set_ready(true);

    let shutdown = {
        let health = Arc::clone(&health);
        let cancel = cancel.clone();
        async move {
            wait_for_signal().await;
            tracing::info!("shutdown signal received");
            health.set_ready(false);
            cancel.cancel();
        }
    };

    let addr = config.listen.addr;
    if config.tls.disabled {
        tracing::warn!(%addr, "TLS disabled; serving plaintext HTTP");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;
    } else {
        let (cert, key) = match (&config.tls.cert, &config.tls.key) {
            (Some(cert), Some(key)) => (cert.clone(), key.clone()),
            _ => return Err(ServerError::MissingTlsMaterial),
        };
        let rustls = crate::tls::rustls_config(&cert, &key).await?;
        tracing::info!(%addr, "listening with TLS");
        let handle = axum_server::Handle::new();
        {
            let handle = handle.clone();
            tokio::spawn(async move {
                shutdown.await;
                handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });
        }
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;
    }

    tracing::info!("controller stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(err) => {
                tracing::error!(error = %err, "cannot install SIGTERM handler");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
