// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential stores for the three trust domains.
//!
//! Admin API keys, agent bearer tokens, and the optional scanner token are
//! independent sets; presenting a credential from one surface to another
//! never succeeds. All comparisons are constant-time. Key material is
//! never logged.

use subtle::ConstantTimeEq;

use crate::config::AuthFileConfig;

/// Verified credential sets, one per surface.
#[derive(Default)]
pub struct AuthKeys {
    admin_keys: Vec<String>,
    agent_tokens: Vec<String>,
    scanner_token: Option<String>,
}

/// Constant-time membership test. Every candidate is compared in full;
/// only equal-length pairs can match, which leaks length and nothing else.
fn ct_contains(haystack: &[String], needle: &str) -> bool {
    let mut found = 0u8;
    for candidate in haystack {
        if candidate.len() == needle.len() {
            found |= candidate.as_bytes().ct_eq(needle.as_bytes()).unwrap_u8();
        }
    }
    found == 1
}

impl AuthKeys {
    pub fn from_config(config: &AuthFileConfig) -> Self {
        Self {
            admin_keys: config.admin_keys.clone(),
            agent_tokens: config.agent_tokens.clone(),
            scanner_token: config.scanner_token.clone(),
        }
    }

    /// `X-API-Key` on the admin surface.
    pub fn verify_admin(&self, key: Option<&str>) -> bool {
        match key {
            Some(key) => ct_contains(&self.admin_keys, key),
            None => false,
        }
    }

    /// Bearer token on the agent surface.
    pub fn verify_agent(&self, token: Option<&str>) -> bool {
        match token {
            Some(token) => ct_contains(&self.agent_tokens, token),
            None => false,
        }
    }

    /// Bearer token on the scanner surface; an unset token leaves the
    /// surface open (mTLS or a fronting proxy handles it).
    pub fn verify_scanner(&self, token: Option<&str>) -> bool {
        match &self.scanner_token {
            None => true,
            Some(expected) => token
                .map(|t| ct_contains(std::slice::from_ref(expected), t))
                .unwrap_or(false),
        }
    }
}

/// Strip a `Bearer ` prefix.
pub fn bearer(header: Option<&str>) -> Option<&str> {
    header.and_then(|value| value.strip_prefix("Bearer "))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
