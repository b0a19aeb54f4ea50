// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifiers.
//!
//! Every entity in the system is identified by a UUID carried inline in a
//! fixed-size buffer. Agents choose their own IDs on first contact, so
//! inbound IDs go through [`define_id!`]'s `parse()` and are never trusted
//! as-is; controller-assigned IDs come from `generate()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte length of a canonical hyphenated UUID.
pub const ID_LEN: usize = 36;

/// Error returned when an inbound identifier is not a well-formed UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid UUID: {input:?}")]
pub struct ParseIdError {
    pub input: String,
}

/// Fixed-size inline UUID text buffer. Always 36 ASCII bytes, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdBuf {
    buf: [u8; ID_LEN],
}

impl IdBuf {
    /// Parse and canonicalize a UUID string (lowercased hyphenated form).
    pub fn parse(s: &str) -> Result<Self, ParseIdError> {
        let parsed: uuid::Uuid = s.parse().map_err(|_| ParseIdError { input: s.to_string() })?;
        Ok(Self::from_uuid(parsed))
    }

    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self::from_uuid(uuid::Uuid::new_v4())
    }

    fn from_uuid(u: uuid::Uuid) -> Self {
        let mut buf = [0u8; ID_LEN];
        u.hyphenated().encode_lower(&mut buf);
        Self { buf }
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only constructed from uuid's ASCII encoder.
        match std::str::from_utf8(&self.buf) {
            Ok(s) => s,
            Err(_) => unreachable!("IdBuf constructed from non-UTF-8"),
        }
    }
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash the active bytes as a str so it matches str::hash,
        // which is required for Borrow<str> HashMap lookups.
        self.as_str().hash(state);
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IdBuf::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Define a newtype ID wrapper around [`IdBuf`].
///
/// Generates `generate()` for fresh v4 IDs, `parse()` for validating inbound
/// strings, `as_str()`, `short()`, `Display`, `TryFrom<&str>`,
/// `PartialEq<str>`, `Borrow<str>`, and `Deref` implementations.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct ScanId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $crate::id::IdBuf);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self($crate::id::IdBuf::generate())
            }

            /// Parse an inbound identifier, rejecting anything that is not
            /// a well-formed UUID.
            pub fn parse(s: impl AsRef<str>) -> Result<Self, $crate::id::ParseIdError> {
                $crate::id::IdBuf::parse(s.as_ref()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                let s = self.0.as_str();
                &s[..std::cmp::min(n, s.len())]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::id::ParseIdError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

crate::define_id! {
    /// Identifier an agent chooses for itself on first contact. Immutable
    /// for the life of the agent.
    pub struct AgentId;
}

crate::define_id! {
    /// Controller-assigned scan identifier.
    pub struct ScanId;
}

crate::define_id! {
    /// Job identifier, unique per (scan, agent) pair.
    pub struct JobId;
}

crate::define_id! {
    /// Identifier assigned to a persisted finding.
    pub struct ResultId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
