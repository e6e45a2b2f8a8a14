//! Storage error handling
//!
//! Typed errors for the annotation backend. The store boundary converts most
//! of these into silent cache-only degradation; they stay typed so the few
//! surfaced cases (reset) carry useful context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during backend operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for backend operations
pub type StoreResult<T> = Result<T, StoreError>;
