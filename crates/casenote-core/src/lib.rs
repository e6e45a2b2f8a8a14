//! casenote Core Library
//!
//! This crate provides the annotation persistence and export core for
//! casenote, a viewer for data-rich genomics case reports. A reviewer
//! annotates a rendered report (notes, variant tiers, therapy labels); the
//! annotations live in a document-scoped, write-through key-value store and
//! travel inside exported, self-contained artifacts.
//!
//! # Architecture
//!
//! - **Cache**: synchronous in-memory mirror, the source of truth for reads
//! - **SQLite**: durable, best-effort backing store shared across documents
//! - **Namespaces**: per-document key prefixes, the sole isolation mechanism
//! - **Diff/reconciliation**: minimal exports, revision-arbitrated loads
//!
//! # Quick Start
//!
//! ```text
//! let report = Report::load(&path)?;
//! let ns = namespace::resolve(&report);
//! let mut store = AnnotationStore::open(&config, ns);
//! store.load_namespace().await;
//! reconcile(&mut store, &report).await;
//!
//! store.set("note.summary", "Discussed at tumor board.").await;
//! let artifact = export_snapshot(&report, &store, config.resource_dir.as_deref())?;
//! ```
//!
//! # Modules
//!
//! - `store`: the annotation store (main entry point)
//! - `report`: the rendered case-report document model
//! - `namespace`: namespace resolution and key prefixing
//! - `baseline`: pre-annotation defaults (the diff origin)
//! - `diff`: diff computation and revision reconciliation
//! - `snapshot`: self-contained artifact export
//! - `revision`: the fixed-encoding revision marker
//! - `storage`: SQLite backend
//! - `config`: application configuration

pub mod baseline;
pub mod config;
pub mod diff;
pub mod namespace;
pub mod report;
pub mod revision;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use baseline::{collect_live_values, compute_baseline};
pub use config::Config;
pub use diff::{compute_diff, reconcile, Reconciliation};
pub use namespace::{NamespaceError, NamespaceId};
pub use report::{Field, FieldKind, Report, ReportError, ReportMeta, Resource, StateBlock};
pub use revision::{RevisionError, RevisionMarker, REVISION_KEY};
pub use snapshot::{export_snapshot, ExportError};
pub use storage::{SqliteBackend, StoreError};
pub use store::{AnnotationStore, NamespaceExport};
