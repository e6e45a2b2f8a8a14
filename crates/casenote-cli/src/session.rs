//! Report session handling
//!
//! Every command that touches a report goes through the same sequence:
//! load the report file, resolve its namespace, open the annotation store,
//! load the namespace, and run reconciliation. Mutating commands also make
//! sure the report carries an identity marker, writing the file back if one
//! had to be generated.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use casenote_core::{namespace, reconcile, AnnotationStore, Config, Report};

/// An open report plus its annotation store
pub struct Session {
    pub report: Report,
    pub store: AnnotationStore,
    pub config: Config,
}

impl Session {
    /// Open a report read-only
    ///
    /// Identity-less reports resolve to the sentinel namespace; nothing is
    /// written back.
    pub async fn open(path: &Path) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let report = Report::load(path)
            .with_context(|| format!("Failed to load report {}", path.display()))?;
        let ns = namespace::resolve(&report);
        Self::finish(config, report, ns).await
    }

    /// Open a report for annotation
    ///
    /// Creates the identity marker if absent and rewrites the report file,
    /// so annotations never land in the shared sentinel namespace.
    pub async fn open_mut(path: &Path) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let mut report = Report::load(path)
            .with_context(|| format!("Failed to load report {}", path.display()))?;

        let had_marker = report.meta.namespace_id.is_some();
        let ns = namespace::ensure_namespace(&mut report);
        if !had_marker {
            report
                .save(path)
                .context("Failed to write generated identity marker back to report")?;
            debug!(namespace = %ns, "assigned identity marker to report");
        }

        Self::finish(config, report, ns).await
    }

    async fn finish(config: Config, report: Report, ns: casenote_core::NamespaceId) -> Result<Self> {
        let mut store = AnnotationStore::open(&config, ns);
        store.load_namespace().await;

        let result = reconcile(&mut store, &report).await;
        debug!(?result, "reconciled state sources");

        Ok(Self {
            report,
            store,
            config,
        })
    }
}
