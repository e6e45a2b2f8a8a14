//! Baseline engine
//!
//! The baseline of a report is the value every storable field has before any
//! reviewer annotation. It is the diff origin: an exported artifact embeds
//! only entries that differ from it.
//!
//! Baselines are transient and recomputed on demand. The computation is pure
//! (no store access) and depends only on the rendered structure, so the same
//! baseline comes out of a live report and of a freshly produced clone.

use std::collections::BTreeMap;

use crate::report::{FieldKind, Report};

/// Compute the baseline map for a rendered report
///
/// One walk over the fields, collecting each field's pre-annotation default:
/// - select fields: the declared default option
/// - text fields: the declared initial value if present, otherwise the
///   literally rendered content
/// - note fields: always empty, regardless of rendered content
pub fn compute_baseline(report: &Report) -> BTreeMap<String, String> {
    let mut baseline = BTreeMap::new();

    for field in &report.fields {
        let default = match &field.kind {
            FieldKind::Select { default, .. } => default.clone(),
            FieldKind::Text { initial } => {
                initial.clone().unwrap_or_else(|| field.value.clone())
            }
            FieldKind::Note => String::new(),
        };
        baseline.insert(field.key.clone(), default);
    }

    baseline
}

/// Collect the current value of every storable field
///
/// Rendered content overlaid with the cached annotations: the cache wins
/// where it holds a key, the rendering supplies the rest.
pub fn collect_live_values(
    report: &Report,
    store: &crate::store::AnnotationStore,
) -> BTreeMap<String, String> {
    report
        .fields
        .iter()
        .map(|field| {
            let value = store
                .get_opt(&field.key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| field.value.clone());
            (field.key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NamespaceId;
    use crate::report::Field;
    use crate::store::AnnotationStore;

    fn sample_report() -> Report {
        let mut report = Report::new("Tumor Panel", "CASE-7");
        report.fields.push(Field::select(
            "tier.BRAF_V600E",
            vec!["1".into(), "2".into(), "3".into(), "4".into()],
            "3",
        ));
        report
            .fields
            .push(Field::text("interp.BRAF_V600E", "Pathogenic variant."));
        report.fields.push(Field::note("note.summary"));
        report
    }

    #[test]
    fn test_select_baseline_is_declared_default() {
        let mut report = sample_report();
        // Rendered value differs from the default; baseline must ignore it
        report.field_mut("tier.BRAF_V600E").unwrap().value = "1".to_string();

        let baseline = compute_baseline(&report);
        assert_eq!(baseline["tier.BRAF_V600E"], "3");
    }

    #[test]
    fn test_text_baseline_prefers_declared_initial() {
        let mut report = sample_report();
        report.field_mut("interp.BRAF_V600E").unwrap().value = "edited text".to_string();

        let baseline = compute_baseline(&report);
        assert_eq!(baseline["interp.BRAF_V600E"], "Pathogenic variant.");
    }

    #[test]
    fn test_text_baseline_falls_back_to_rendered_content() {
        let mut report = Report::new("T", "C");
        report.fields.push(Field {
            key: "interp.x".to_string(),
            kind: crate::report::FieldKind::Text { initial: None },
            value: "rendered".to_string(),
        });

        let baseline = compute_baseline(&report);
        assert_eq!(baseline["interp.x"], "rendered");
    }

    #[test]
    fn test_note_baseline_is_empty_even_when_rendered() {
        let mut report = sample_report();
        report.field_mut("note.summary").unwrap().value = "legacy inline note".to_string();

        let baseline = compute_baseline(&report);
        assert_eq!(baseline["note.summary"], "");
    }

    #[test]
    fn test_baseline_identical_on_clone() {
        let report = sample_report();
        let clone = report.clone();
        assert_eq!(compute_baseline(&report), compute_baseline(&clone));
    }

    #[tokio::test]
    async fn test_collect_live_values_overlays_cache() {
        let report = sample_report();
        let mut store = AnnotationStore::open_cache_only(NamespaceId::sentinel());
        store.set("note.summary", "reviewer note").await;

        let live = collect_live_values(&report, &store);
        assert_eq!(live["note.summary"], "reviewer note");
        // Unannotated fields come from the rendering
        assert_eq!(live["tier.BRAF_V600E"], "3");
        assert_eq!(live["interp.BRAF_V600E"], "Pathogenic variant.");
    }
}
