// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS termination for the shared listener.
//!
//! rustls via axum-server; TLS 1.2 is the floor and 1.3 is preferred,
//! which is rustls's own default protocol set.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot load TLS material (cert {cert}, key {key}): {source}")]
    Load {
        cert: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load certificate and key PEM files.
pub async fn rustls_config(cert: &Path, key: &Path) -> Result<RustlsConfig, TlsError> {
    RustlsConfig::from_pem_file(cert, key).await.map_err(|source| TlsError::Load {
        cert: cert.display().to_string(),
        key: key.display().to_string(),
        source,
    })
}
