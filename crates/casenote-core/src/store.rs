//! Annotation store
//!
//! The `AnnotationStore` is the write-through key-value store behind every
//! reviewer edit. It pairs a synchronous in-memory cache (the single source
//! of truth for reads) with a durable SQLite backend written to
//! asynchronously and best-effort.
//!
//! ## Ordering guarantees
//!
//! - `set` followed by `get` on the same key always observes the new value:
//!   the cache mutation is synchronous and precedes the durable write.
//! - `load_namespace` fully clears and repopulates the cache before
//!   resolving, so callers never observe a mixed old/new cache.
//! - Durable writes for different keys may settle in any order; the cache,
//!   not settle order, is authoritative.
//!
//! ## Failure semantics
//!
//! Backend errors during `set`/`remove`/`load_namespace` are logged and
//! swallowed: losing durability for one edit must not break the interactive
//! session. A backend that fails to open degrades the whole session to
//! cache-only operation. Only `reset_namespace` surfaces backend errors,
//! because a reset the user confirmed must not silently half-happen.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::namespace::{self, NamespaceId};
use crate::revision::{RevisionMarker, REVISION_KEY};
use crate::storage::{SqliteBackend, StoreResult};

/// Bulk snapshot of one namespace's entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceExport {
    pub namespace: NamespaceId,
    pub entries: BTreeMap<String, String>,
}

/// Document-scoped annotation store
///
/// Constructed once per open document instance and passed by reference to
/// every collaborator. All operations are implicitly scoped to the current
/// namespace.
pub struct AnnotationStore {
    /// Namespace every operation is scoped to
    namespace: NamespaceId,
    /// Synchronous mirror of the namespace's entries, keyed by caller key
    cache: HashMap<String, String>,
    /// Durable backend; `None` when the session is degraded to cache-only
    backend: Option<SqliteBackend>,
}

impl AnnotationStore {
    /// Open a store for one document instance
    ///
    /// A backend that fails to open is logged and dropped: the session
    /// continues with annotations held in memory only. This is deliberate —
    /// storage trouble must never surface as an error while a report is
    /// being reviewed.
    pub fn open(config: &Config, namespace: NamespaceId) -> Self {
        let backend = match SqliteBackend::open(config) {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Annotation backend unavailable, session is cache-only: {e}");
                None
            }
        };

        Self {
            namespace,
            cache: HashMap::new(),
            backend,
        }
    }

    /// Open a store with no durable backend (cache-only)
    pub fn open_cache_only(namespace: NamespaceId) -> Self {
        Self {
            namespace,
            cache: HashMap::new(),
            backend: None,
        }
    }

    /// The namespace this store is scoped to
    pub fn namespace(&self) -> &NamespaceId {
        &self.namespace
    }

    /// Whether edits are being persisted durably
    pub fn is_durable(&self) -> bool {
        self.backend.is_some()
    }

    /// Number of entries currently cached
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear the cache and repopulate it from the backend
    ///
    /// Tolerates any row order from the backend scan. Resolves successfully
    /// even if the scan fails: report loading must never block on storage,
    /// so a failed scan leaves the cache empty and the session effectively
    /// fresh.
    pub async fn load_namespace(&mut self) {
        self.cache.clear();

        let Some(backend) = &self.backend else {
            return;
        };

        let prefix = namespace::namespace_prefix(&self.namespace);
        match backend.scan_prefix(&prefix) {
            Ok(entries) => {
                for (storage_key, value) in entries {
                    if let Some(key) = namespace::caller_key(&self.namespace, &storage_key) {
                        self.cache.insert(key.to_string(), value);
                    }
                }
                debug!(
                    namespace = %self.namespace,
                    entries = self.cache.len(),
                    "loaded namespace"
                );
            }
            Err(e) => {
                warn!("Failed to load namespace {}: {e}", self.namespace);
            }
        }
    }

    /// Synchronous read: the cached value, or `fallback` if absent
    pub fn get(&self, key: &str, fallback: &str) -> String {
        self.cache
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Synchronous read returning `None` for absent keys
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.cache.get(key).map(|s| s.as_str())
    }

    /// Write one entry: cache first, then best-effort durable write
    ///
    /// The cache update is synchronous, so a `get` issued immediately after
    /// observes the new value regardless of backend latency. Backend errors
    /// are logged and swallowed.
    pub async fn set(&mut self, key: &str, value: &str) {
        self.cache.insert(key.to_string(), value.to_string());

        if let Some(backend) = &self.backend {
            let storage_key = namespace::storage_key(&self.namespace, key);
            if let Err(e) = backend.put(&storage_key, value) {
                warn!("Durable write failed for '{key}', keeping cached value: {e}");
            }
        }
    }

    /// Remove one entry: cache first, then best-effort durable delete
    pub async fn remove(&mut self, key: &str) {
        self.cache.remove(key);

        if let Some(backend) = &self.backend {
            let storage_key = namespace::storage_key(&self.namespace, key);
            if let Err(e) = backend.delete(&storage_key) {
                warn!("Durable delete failed for '{key}': {e}");
            }
        }
    }

    /// Delete every entry in the current namespace
    ///
    /// The backend delete enumerates matching keys and removes them one at a
    /// time; it is best-effort, not transactional. On failure the error is
    /// returned and the cache is left untouched, so from the caller's
    /// perspective the reset did not happen (some backend rows may already
    /// be gone — the next `load_namespace` reflects whatever remains).
    pub async fn reset_namespace(&mut self) -> StoreResult<()> {
        if let Some(backend) = &self.backend {
            let prefix = namespace::namespace_prefix(&self.namespace);
            backend.delete_prefix(&prefix)?;
        }

        self.cache.clear();
        Ok(())
    }

    /// Bulk read of the namespace's full entry set (from the cache)
    pub fn export_namespace(&self) -> NamespaceExport {
        NamespaceExport {
            namespace: self.namespace.clone(),
            entries: self.cache.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Bulk write of entries into the current namespace
    ///
    /// Idempotent: re-importing identical entries leaves the same state.
    /// Malformed wire input is handled before this point (see
    /// [`crate::report::StateBlock::decode`], which turns anything
    /// unparseable into an empty entry set). Returns the number of entries
    /// imported.
    pub async fn import_entries(&mut self, entries: &BTreeMap<String, String>) -> usize {
        let mut count = 0;
        for (key, value) in entries {
            self.set(key, value).await;
            count += 1;
        }
        count
    }

    /// Switch to a different namespace, discarding the cache and reloading
    pub async fn switch_namespace(&mut self, namespace: NamespaceId) {
        self.namespace = namespace;
        self.cache.clear();
        self.load_namespace().await;
    }

    /// The cached revision marker, if present and well-formed
    pub fn revision(&self) -> Option<RevisionMarker> {
        self.cache
            .get(REVISION_KEY)
            .and_then(|s| RevisionMarker::parse(s).ok())
    }
}
