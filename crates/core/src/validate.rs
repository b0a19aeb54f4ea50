// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input validation for scan specifications and submitted findings.
//!
//! Everything an upstream manager or an agent sends through the API funnels
//! through these checks. Rejections name the offending value; nothing is
//! silently coerced.

use thiserror::Error;

/// Validation failures surfaced as `VALIDATION_ERROR` at the API layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid VT OID: {0:?}")]
    InvalidOid(String),

    #[error("invalid port descriptor: {0:?}")]
    InvalidPort(String),

    #[error("invalid port range: {0:?}")]
    InvalidPortRange(String),

    #[error("unrecognized scanner preference: {0:?}")]
    UnknownPreference(String),

    #[error("severity out of range [0.0, 10.0]: {0}")]
    SeverityOutOfRange(f64),

    #[error("empty field: {0}")]
    Empty(&'static str),
}

/// Check a VT object identifier: dotted-decimal with at least three
/// components, digits only (e.g. `1.3.6.1.4.1.25623.1.0.10662`).
pub fn check_oid(oid: &str) -> Result<(), ValidationError> {
    let err = || ValidationError::InvalidOid(oid.to_string());
    let components: Vec<&str> = oid.split('.').collect();
    if components.len() < 3 {
        return Err(err());
    }
    for c in &components {
        if c.is_empty() || !c.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
    }
    Ok(())
}

/// Check a finding port descriptor: a bare port (`443`) or
/// `port/protocol` with protocol `tcp` or `udp` (e.g. `22/tcp`).
pub fn check_port(port: &str) -> Result<(), ValidationError> {
    let err = || ValidationError::InvalidPort(port.to_string());
    let (num, proto) = match port.split_once('/') {
        Some((num, proto)) => (num, Some(proto)),
        None => (port, None),
    };
    match num.parse::<u32>() {
        Ok(n) if (1..=65_535).contains(&n) => {}
        _ => return Err(err()),
    }
    match proto {
        None | Some("tcp") | Some("udp") => Ok(()),
        Some(_) => Err(err()),
    }
}

/// Check a scan target port list: comma-separated ports or `a-b` ranges,
/// e.g. `22,80,1024-2048`.
pub fn check_port_list(list: &str) -> Result<(), ValidationError> {
    let err = || ValidationError::InvalidPortRange(list.to_string());
    if list.trim().is_empty() {
        return Err(err());
    }
    for item in list.split(',') {
        let item = item.trim();
        match item.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.parse().map_err(|_| err())?;
                let hi: u32 = hi.parse().map_err(|_| err())?;
                if lo == 0 || hi > 65_535 || lo > hi {
                    return Err(err());
                }
            }
            None => {
                let p: u32 = item.parse().map_err(|_| err())?;
                if !(1..=65_535).contains(&p) {
                    return Err(err());
                }
            }
        }
    }
    Ok(())
}

/// One entry of the recognized scanner preference catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PreferenceSpec {
    pub key: &'static str,
    pub description: &'static str,
    pub default: &'static str,
}

/// The enumerated set of scanner preferences a scan may carry. Anything
/// outside this list is rejected at scan creation.
pub const PREFERENCE_CATALOG: &[PreferenceSpec] = &[
    PreferenceSpec {
        key: "max_checks",
        description: "Maximum concurrently executed VTs per host",
        default: "4",
    },
    PreferenceSpec {
        key: "max_hosts",
        description: "Maximum concurrently scanned hosts",
        default: "20",
    },
    PreferenceSpec {
        key: "checks_read_timeout",
        description: "Socket read timeout in seconds during checks",
        default: "5",
    },
    PreferenceSpec {
        key: "optimize_test",
        description: "Only launch VTs whose prerequisites are met",
        default: "yes",
    },
    PreferenceSpec {
        key: "safe_checks",
        description: "Disable VTs that may harm the target",
        default: "yes",
    },
    PreferenceSpec {
        key: "alive_test_ports",
        description: "Ports probed during the alive test",
        default: "21-23,25,53,80,110,443,8080",
    },
    PreferenceSpec {
        key: "test_empty_vhost",
        description: "Also test the IP without a vhost header",
        default: "no",
    },
    PreferenceSpec {
        key: "expand_vhosts",
        description: "Expand the target host list with discovered vhosts",
        default: "yes",
    },
];

/// Check a scanner preference key against the enumerated catalog.
pub fn check_preference(key: &str) -> Result<(), ValidationError> {
    if PREFERENCE_CATALOG.iter().any(|p| p.key == key) {
        Ok(())
    } else {
        Err(ValidationError::UnknownPreference(key.to_string()))
    }
}

/// Check a finding severity against the CVSS range.
pub fn check_severity(severity: f64) -> Result<(), ValidationError> {
    if (0.0..=10.0).contains(&severity) {
        Ok(())
    } else {
        Err(ValidationError::SeverityOutOfRange(severity))
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
