//! Diff computation and revision reconciliation
//!
//! Two independent algorithms share this module:
//!
//! - **Diff computation** (export path): reduce the current field values to
//!   the entries that differ from baseline, plus the revision marker. This
//!   bounds artifact size by edit count, not report size.
//! - **Reconciliation** (load path): decide which candidate state source is
//!   authoritative for a freshly opened report — the durable store, a state
//!   block embedded by a prior export, or legacy inline state written into
//!   the rendering before the store existed. Sources are never merged: the
//!   winner's full entry set is imported wholesale.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::baseline::compute_baseline;
use crate::report::Report;
use crate::revision::{RevisionMarker, REVISION_KEY};
use crate::store::AnnotationStore;

/// Compute the diff set of `live` values against a baseline
///
/// Includes every key whose value differs from the baseline (or has no
/// baseline entry at all), and always the revision marker under
/// [`REVISION_KEY`].
pub fn compute_diff(
    live: &BTreeMap<String, String>,
    baseline: &BTreeMap<String, String>,
    revision: &RevisionMarker,
) -> BTreeMap<String, String> {
    let mut diff = BTreeMap::new();

    for (key, value) in live {
        if baseline.get(key) != Some(value) {
            diff.insert(key.clone(), value.clone());
        }
    }

    diff.insert(REVISION_KEY.to_string(), revision.as_str().to_string());
    diff
}

/// Which state source reconciliation selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A freshly opened exported artifact seeded the empty store
    SeededFromArtifact { imported: usize },
    /// Legacy inline state superseded the store (one-way upgrade)
    UpgradedFromLegacy { imported: usize },
    /// The existing store state stands
    KeptExisting,
}

/// Arbitrate between candidate state sources for a freshly loaded report
///
/// Evaluated in priority order, first applicable wins:
///
/// 1. The report embeds a state block from a prior export AND the cache is
///    empty: import the block wholesale. Seeds a freshly opened artifact.
/// 2. The report carries legacy inline state (a `saved_at` marker from a
///    pre-store exporter) strictly newer than the store's revision marker
///    (or the store is empty): reset the namespace, diff the inline rendered
///    values against a fresh baseline, import the diff. One-way upgrade;
///    never runs when the store holds equal-or-newer state.
/// 3. Otherwise the existing cache/durable state stands.
///
/// Malformed embedded or legacy state counts as absent — reconciliation must
/// never block a report from loading.
pub async fn reconcile(store: &mut AnnotationStore, report: &Report) -> Reconciliation {
    // Step 1: state block embedded by a prior export, into an empty store
    if let Some(block) = report.embedded_state() {
        if store.is_empty() {
            let imported = store.import_entries(&block.entries).await;
            debug!(imported, "seeded store from embedded artifact state");
            return Reconciliation::SeededFromArtifact { imported };
        }
    }

    // Step 2: legacy inline state, strictly newer than what the store holds
    if let Some(legacy_rev) = legacy_revision(report) {
        let supersedes = match store.revision() {
            Some(stored) => legacy_rev > stored,
            // Entries without a revision marker cannot prove recency;
            // a marked legacy source wins over them.
            None => true,
        };

        if store.is_empty() || supersedes {
            if let Err(e) = store.reset_namespace().await {
                warn!("Legacy upgrade skipped, namespace reset failed: {e}");
                return Reconciliation::KeptExisting;
            }

            let baseline = compute_baseline(report);
            let rendered: BTreeMap<String, String> = report
                .fields
                .iter()
                .map(|f| (f.key.clone(), f.value.clone()))
                .collect();
            let diff = compute_diff(&rendered, &baseline, &legacy_rev);

            let imported = store.import_entries(&diff).await;
            debug!(imported, "upgraded store from legacy inline state");
            return Reconciliation::UpgradedFromLegacy { imported };
        }
    }

    Reconciliation::KeptExisting
}

/// The report's legacy revision marker, if present and parseable
fn legacy_revision(report: &Report) -> Option<RevisionMarker> {
    let raw = report.meta.saved_at.as_deref()?;
    match RevisionMarker::parse(raw) {
        Ok(rev) => Some(rev),
        Err(_) => {
            debug!("Ignoring unparseable legacy revision marker '{raw}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NamespaceId;
    use crate::report::Field;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn marker(y: i32, mo: u32, d: u32) -> RevisionMarker {
        RevisionMarker::from_datetime(Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0).unwrap())
    }

    fn store() -> AnnotationStore {
        AnnotationStore::open_cache_only(NamespaceId::sentinel())
    }

    fn report_with_note() -> Report {
        let mut report = Report::new("Panel", "CASE-1");
        report.fields.push(Field::select(
            "tier.x",
            vec!["1".into(), "2".into(), "3".into()],
            "3",
        ));
        report.fields.push(Field::note("note.summary"));
        report
    }

    #[test]
    fn test_diff_excludes_values_equal_to_baseline() {
        let baseline: BTreeMap<String, String> = [("tier.x".to_string(), "3".to_string())].into();
        let live = baseline.clone();
        let rev = marker(2024, 1, 1);

        let diff = compute_diff(&live, &baseline, &rev);
        // Only the always-present revision marker
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[REVISION_KEY], rev.as_str());
    }

    #[test]
    fn test_diff_includes_changed_values() {
        let baseline: BTreeMap<String, String> = [("tier.x".to_string(), "3".to_string())].into();
        let live: BTreeMap<String, String> = [("tier.x".to_string(), "1".to_string())].into();

        let diff = compute_diff(&live, &baseline, &marker(2024, 1, 1));
        assert_eq!(diff["tier.x"], "1");
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn test_diff_includes_keys_without_baseline_entry() {
        let baseline = BTreeMap::new();
        let live: BTreeMap<String, String> =
            [("note.extra".to_string(), "added".to_string())].into();

        let diff = compute_diff(&live, &baseline, &marker(2024, 1, 1));
        assert_eq!(diff["note.extra"], "added");
    }

    #[tokio::test]
    async fn test_embedded_state_seeds_empty_store() {
        let mut report = report_with_note();
        report.state = Some(json!({ "entries": { "note.summary": "from artifact" } }));

        let mut store = store();
        let result = reconcile(&mut store, &report).await;

        assert_eq!(result, Reconciliation::SeededFromArtifact { imported: 1 });
        assert_eq!(store.get("note.summary", ""), "from artifact");
    }

    #[tokio::test]
    async fn test_embedded_state_skipped_when_store_has_entries() {
        let mut report = report_with_note();
        report.state = Some(json!({ "entries": { "note.summary": "from artifact" } }));

        let mut store = store();
        store.set("note.summary", "already here").await;

        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::KeptExisting);
        assert_eq!(store.get("note.summary", ""), "already here");
    }

    #[tokio::test]
    async fn test_malformed_embedded_state_is_ignored() {
        let mut report = report_with_note();
        report.state = Some(json!({ "bogus": true }));

        let mut store = store();
        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::KeptExisting);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_upgrade_runs_when_inline_state_is_newer() {
        let mut report = report_with_note();
        report.field_mut("note.summary").unwrap().value = "inline note".to_string();
        report.field_mut("tier.x").unwrap().value = "1".to_string();
        report.meta.saved_at = Some(marker(2024, 1, 3).as_str().to_string());

        let mut store = store();
        store.set(REVISION_KEY, marker(2024, 1, 2).as_str()).await;
        store.set("note.summary", "stale stored note").await;

        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::UpgradedFromLegacy { imported: 3 });

        // Wholesale replacement: stored state was reset, then reseeded
        assert_eq!(store.get("note.summary", ""), "inline note");
        assert_eq!(store.get("tier.x", ""), "1");
        assert_eq!(store.revision(), Some(marker(2024, 1, 3)));
    }

    #[tokio::test]
    async fn test_legacy_upgrade_never_runs_when_store_is_newer() {
        let mut report = report_with_note();
        report.field_mut("note.summary").unwrap().value = "old inline note".to_string();
        report.meta.saved_at = Some(marker(2024, 1, 1).as_str().to_string());

        let mut store = store();
        store.set(REVISION_KEY, marker(2024, 1, 2).as_str()).await;
        store.set("note.summary", "newer stored note").await;

        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::KeptExisting);
        assert_eq!(store.get("note.summary", ""), "newer stored note");
    }

    #[tokio::test]
    async fn test_legacy_upgrade_never_runs_on_equal_revision() {
        let mut report = report_with_note();
        report.meta.saved_at = Some(marker(2024, 1, 2).as_str().to_string());

        let mut store = store();
        store.set(REVISION_KEY, marker(2024, 1, 2).as_str()).await;
        store.set("note.summary", "stored").await;

        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::KeptExisting);
    }

    #[tokio::test]
    async fn test_legacy_upgrade_runs_into_empty_store() {
        let mut report = report_with_note();
        report.field_mut("note.summary").unwrap().value = "inline".to_string();
        report.meta.saved_at = Some(marker(2024, 1, 1).as_str().to_string());

        let mut store = store();
        let result = reconcile(&mut store, &report).await;

        assert!(matches!(result, Reconciliation::UpgradedFromLegacy { .. }));
        assert_eq!(store.get("note.summary", ""), "inline");
    }

    #[tokio::test]
    async fn test_malformed_legacy_marker_is_ignored() {
        let mut report = report_with_note();
        report.field_mut("note.summary").unwrap().value = "inline".to_string();
        report.meta.saved_at = Some("last tuesday".to_string());

        let mut store = store();
        let result = reconcile(&mut store, &report).await;
        assert_eq!(result, Reconciliation::KeptExisting);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_embedded_state_takes_priority_over_legacy() {
        let mut report = report_with_note();
        report.state = Some(json!({ "entries": { "note.summary": "from artifact" } }));
        report.field_mut("note.summary").unwrap().value = "inline".to_string();
        report.meta.saved_at = Some(marker(2024, 1, 5).as_str().to_string());

        let mut store = store();
        let result = reconcile(&mut store, &report).await;

        assert!(matches!(result, Reconciliation::SeededFromArtifact { .. }));
        assert_eq!(store.get("note.summary", ""), "from artifact");
    }
}
