//! Storage layer
//!
//! Durable SQLite backend behind the annotation store.
//!
//! ## Architecture
//!
//! - **Cache** (in `store`): synchronous source of truth for reads
//! - **SQLite**: durable, best-effort mirror of the cache
//!
//! The store writes through to SQLite asynchronously; a backend failure
//! degrades the session to cache-only operation instead of erroring.

pub mod backend;
pub mod error;
pub mod schema;

pub use backend::SqliteBackend;
pub use error::{StoreError, StoreResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
