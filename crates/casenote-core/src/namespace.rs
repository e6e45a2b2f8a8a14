//! Namespace resolution and key prefixing
//!
//! Every open report instance owns a namespace: an opaque identifier stored
//! in the report's metadata (the identity marker). The annotation database is
//! shared process-wide, so the prefixing scheme built here is the sole
//! isolation mechanism between documents.
//!
//! Freshly generated namespaces are UUIDv4 bytes rendered as bs58check
//! strings. Reports without an identity marker resolve to a fixed sentinel
//! namespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::report::Report;

/// Prefix shared by every storage key this crate writes
const KEY_PREFIX: &str = "casenote";

/// Separator between prefix, namespace, and caller key
///
/// Must never appear in a generated namespace id (bs58 alphabet and the
/// sentinel are both free of it).
const KEY_SEP: &str = "::";

/// Sentinel namespace for reports that carry no identity marker
const SENTINEL: &str = "unassigned";

/// Errors from namespace id parsing
#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("Invalid namespace id encoding: {0}")]
    InvalidEncoding(String),

    #[error("Namespace id has wrong length: expected 16 bytes, got {0}")]
    WrongLength(usize),
}

/// Opaque identifier binding stored annotations to one document instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Generate a fresh, globally unique namespace id
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        Self(bs58::encode(uuid.as_bytes()).with_check().into_string())
    }

    /// The fixed sentinel namespace for identity-less reports
    pub fn sentinel() -> Self {
        Self(SENTINEL.to_string())
    }

    /// Whether this is the sentinel namespace
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL
    }

    /// Parse a generated (non-sentinel) namespace id, validating the encoding
    pub fn from_bs58check(s: &str) -> Result<Self, NamespaceError> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| NamespaceError::InvalidEncoding(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(NamespaceError::WrongLength(bytes.len()));
        }
        Ok(Self(s.to_string()))
    }

    /// Wrap an identity marker read from a report
    ///
    /// Markers are treated as opaque: any non-empty string is accepted.
    /// Returns `None` for empty markers.
    pub fn from_marker(marker: &str) -> Option<Self> {
        let trimmed = marker.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The marker string as stored in report metadata
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolve the namespace for a rendered report
///
/// Reads the identity marker from the report metadata; an absent or empty
/// marker resolves to the sentinel namespace. Pure and deterministic for a
/// fixed document identity.
pub fn resolve(report: &Report) -> NamespaceId {
    report
        .meta
        .namespace_id
        .as_deref()
        .and_then(NamespaceId::from_marker)
        .unwrap_or_else(NamespaceId::sentinel)
}

/// Resolve the namespace, creating the identity marker if absent
///
/// Mutating commands call this so that annotations never land in the shared
/// sentinel namespace. The caller is responsible for persisting the report
/// if a marker was generated.
pub fn ensure_namespace(report: &mut Report) -> NamespaceId {
    if let Some(ns) = report
        .meta
        .namespace_id
        .as_deref()
        .and_then(NamespaceId::from_marker)
    {
        return ns;
    }

    let ns = NamespaceId::generate();
    report.meta.namespace_id = Some(ns.as_str().to_string());
    ns
}

/// Build the globally unique storage key for a caller key in a namespace
///
/// Pure function: `prefix :: namespace :: key`. Two namespaces can never
/// collide in the shared backend because the namespace segment differs.
pub fn storage_key(namespace: &NamespaceId, key: &str) -> String {
    format!(
        "{}{}{}{}{}",
        KEY_PREFIX,
        KEY_SEP,
        namespace.as_str(),
        KEY_SEP,
        key
    )
}

/// The scan prefix covering every key in a namespace
pub fn namespace_prefix(namespace: &NamespaceId) -> String {
    format!("{}{}{}{}", KEY_PREFIX, KEY_SEP, namespace.as_str(), KEY_SEP)
}

/// Recover the caller key from a storage key produced by [`storage_key`]
///
/// Returns `None` if the storage key does not belong to the namespace.
pub fn caller_key<'a>(namespace: &NamespaceId, storage_key: &'a str) -> Option<&'a str> {
    storage_key.strip_prefix(namespace_prefix(namespace).as_str())
}
