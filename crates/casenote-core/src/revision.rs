//! Revision markers
//!
//! Reconciliation arbitrates between state sources by comparing a single
//! reserved entry, the revision marker. The marker is a UTC timestamp in one
//! fixed-width, zero-padded encoding (`YYYY-MM-DDTHH:MM:SS.mmmZ`) so that
//! lexicographic comparison of the stored strings equals chronological
//! comparison. The newtype exists to make that encoding a checked contract
//! instead of an implicit string convention.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reserved entry key holding the revision marker
pub const REVISION_KEY: &str = "meta.revision";

/// Errors from revision marker parsing
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("Invalid revision timestamp '{value}': {details}")]
    InvalidTimestamp { value: String, details: String },

    #[error("Revision timestamp '{0}' is not in the fixed-width encoding")]
    NonCanonicalEncoding(String),
}

/// A totally-ordered revision timestamp
///
/// Ordering is derived from the stored string, which is valid because every
/// constructor enforces the single fixed-width encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMarker(String);

impl RevisionMarker {
    /// Create a marker for the current instant
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a marker from a specific instant
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parse a stored marker, rejecting any non-canonical encoding
    ///
    /// A marker that parses as a timestamp but re-encodes differently (for
    /// example second precision, an offset suffix, or missing zero padding)
    /// is rejected: markers from foreign encodings would break the
    /// lexicographic-equals-chronological guarantee.
    pub fn parse(s: &str) -> Result<Self, RevisionError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| RevisionError::InvalidTimestamp {
                value: s.to_string(),
                details: e.to_string(),
            })?
            .with_timezone(&Utc);

        let canonical = dt.to_rfc3339_opts(SecondsFormat::Millis, true);
        if canonical != s {
            return Err(RevisionError::NonCanonicalEncoding(s.to_string()));
        }

        Ok(Self(canonical))
    }

    /// The encoded marker string as stored in an entry value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
