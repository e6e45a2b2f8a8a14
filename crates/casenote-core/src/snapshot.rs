//! Snapshot export engine
//!
//! Produces the single self-contained artifact a reviewer downloads: a deep
//! copy of the rendered report with the current annotations applied to its
//! fields, the minimal diff set embedded as a state block, a brand-new
//! namespace identity, and every presentation resource inlined.
//!
//! Any failure aborts the export with a user-visible error; a partial
//! artifact is never produced.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use tracing::debug;

use crate::baseline::{collect_live_values, compute_baseline};
use crate::diff::compute_diff;
use crate::namespace::NamespaceId;
use crate::report::{Report, StateBlock};
use crate::revision::RevisionMarker;
use crate::store::AnnotationStore;

/// Errors that abort a snapshot export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to inline resource '{name}': {details}")]
    Resource { name: String, details: String },

    #[error("Resource '{0}' has no inline content and no href to inline from")]
    UnresolvableResource(String),

    #[error("Resource '{0}' references an external file but no resource root is configured")]
    NoResourceRoot(String),

    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Export the current report state as a self-contained artifact
///
/// - the copy's fields visually reflect the live annotations, so the
///   artifact renders correctly before any store runs;
/// - the embedded state block holds only the diff against baseline, plus the
///   revision marker, so artifact growth is bounded by edit count;
/// - the copy gets a freshly generated namespace identity, so opening the
///   artifact never aliases the source document's stored annotations;
/// - `resource_root` is the directory external resource hrefs resolve
///   against.
///
/// Returns the serialized artifact bytes; delivery is the caller's concern.
pub fn export_snapshot(
    report: &Report,
    store: &AnnotationStore,
    resource_root: Option<&Path>,
) -> Result<Vec<u8>, ExportError> {
    // Deep, independent copy; the live instance is never mutated
    let mut artifact = report.clone();

    // Live values come from the original instance, diff origin from the
    // still-pristine copy (the two baselines are identical by construction)
    let live = collect_live_values(report, store);
    let baseline = compute_baseline(&artifact);
    let diff = compute_diff(&live, &baseline, &RevisionMarker::now());

    // Apply every live value onto the matching field in the copy
    for field in &mut artifact.fields {
        if let Some(value) = live.get(&field.key) {
            field.value = value.clone();
        }
    }

    // Fresh identity: the artifact must never share the source's namespace
    let namespace = NamespaceId::generate();
    artifact.meta.namespace_id = Some(namespace.as_str().to_string());

    // The state block carries the revision now; a stale legacy marker would
    // only invite the one-way upgrade path on reopen
    artifact.meta.saved_at = None;

    // Replaces any block a prior export embedded; the artifact holds at most
    // one, by construction
    artifact.state = Some(serde_json::to_value(StateBlock::new(diff))?);

    inline_resources(&mut artifact, resource_root)?;

    let bytes = serde_json::to_vec_pretty(&artifact)?;
    debug!(
        namespace = %namespace,
        size = bytes.len(),
        "exported snapshot artifact"
    );
    Ok(bytes)
}

/// Inline every externally-referenced resource as base64 content
///
/// Resources that already carry inline content are left alone. A resource
/// that cannot be resolved aborts the export.
fn inline_resources(artifact: &mut Report, resource_root: Option<&Path>) -> Result<(), ExportError> {
    for resource in &mut artifact.resources {
        if resource.is_inlined() {
            continue;
        }

        let Some(href) = &resource.href else {
            return Err(ExportError::UnresolvableResource(resource.name.clone()));
        };
        let Some(root) = resource_root else {
            return Err(ExportError::NoResourceRoot(resource.name.clone()));
        };

        let path = root.join(href);
        let bytes = std::fs::read(&path).map_err(|e| ExportError::Resource {
            name: resource.name.clone(),
            details: format!("{}: {}", path.display(), e),
        })?;

        resource.content = Some(BASE64.encode(bytes));
    }

    Ok(())
}
