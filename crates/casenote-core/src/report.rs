//! Case report document model
//!
//! A `Report` is the rendered, annotatable document: metadata (including the
//! identity marker), the storable fields a reviewer can edit, the
//! presentation resources the rendering references, and optionally the state
//! block a previous export embedded.
//!
//! Reports serialize as JSON. The embedded state block is kept as a raw JSON
//! value on the struct and decoded leniently on demand, so a malformed block
//! can never prevent a report from loading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur loading or saving a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to parse report: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read report '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Report-level metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Identity marker: the namespace id bound to this document instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,

    /// Report title
    pub title: String,

    /// Case identifier assigned by the originating system
    pub case_id: String,

    /// When the report was rendered
    pub created: DateTime<Utc>,

    /// Legacy revision marker written by pre-store exporters
    ///
    /// Kept as a raw string: old artifacts carry whatever encoding their
    /// exporter used, and reconciliation must treat an unparseable marker as
    /// absent rather than fail the load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl ReportMeta {
    pub fn new(title: impl Into<String>, case_id: impl Into<String>) -> Self {
        Self {
            namespace_id: None,
            title: title.into(),
            case_id: case_id.into(),
            created: Utc::now(),
            saved_at: None,
        }
    }
}

/// The kind of a storable field, determining its baseline rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Enumerable control (e.g. a variant tier selector)
    ///
    /// Baseline is the declared default option.
    Select {
        options: Vec<String>,
        default: String,
    },

    /// Editable text with an optional declared initial value
    ///
    /// Baseline is the declared initial value if present, otherwise the
    /// literally rendered content.
    Text { initial: Option<String> },

    /// Free-form reviewer note
    ///
    /// Baseline is always empty, regardless of rendered content.
    Note,
}

/// One storable field in the rendered report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Caller-defined semantic key (e.g. `tier.BRAF_V600E`, `note.summary`)
    pub key: String,

    #[serde(flatten)]
    pub kind: FieldKind,

    /// Rendered content
    pub value: String,
}

impl Field {
    /// Create a select field rendered at its default option
    pub fn select(
        key: impl Into<String>,
        options: Vec<String>,
        default: impl Into<String>,
    ) -> Self {
        let default = default.into();
        Self {
            key: key.into(),
            value: default.clone(),
            kind: FieldKind::Select { options, default },
        }
    }

    /// Create a text field rendered at its initial value
    pub fn text(key: impl Into<String>, initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            key: key.into(),
            value: initial.clone(),
            kind: FieldKind::Text {
                initial: Some(initial),
            },
        }
    }

    /// Create an empty note field
    pub fn note(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Note,
            value: String::new(),
        }
    }
}

/// A presentation resource referenced by the rendering
///
/// `href` points at an external file relative to the resource root;
/// `content` is the inlined base64 payload. Exported artifacts carry
/// `content` for every resource so they are self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Resource {
    /// Whether the resource payload is already inlined
    pub fn is_inlined(&self) -> bool {
        self.content.is_some()
    }
}

/// Canonical embedded state block: the diff set of a prior export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBlock {
    pub entries: BTreeMap<String, String>,
}

/// Accepted wire shapes for the embedded state block
///
/// New artifacts always write the canonical `{ "entries": { ... } }` object.
/// Older exporters wrote a list of `[key, value]` pairs or a single pair;
/// both decode into the canonical form. Anything else is treated as "no
/// embedded state".
#[derive(Deserialize)]
#[serde(untagged)]
enum StateBlockWire {
    Canonical { entries: BTreeMap<String, String> },
    Pairs(Vec<(String, String)>),
    Single((String, String)),
}

impl StateBlock {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Decode a state block from raw JSON, accepting legacy shapes
    ///
    /// Returns `None` for anything that is not one of the known shapes.
    pub fn decode(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<StateBlockWire>(value.clone()).ok()? {
            StateBlockWire::Canonical { entries } => Some(Self { entries }),
            StateBlockWire::Pairs(pairs) => Some(Self {
                entries: pairs.into_iter().collect(),
            }),
            StateBlockWire::Single((key, value)) => {
                let mut entries = BTreeMap::new();
                entries.insert(key, value);
                Some(Self { entries })
            }
        }
    }
}

/// A rendered, annotatable case report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Embedded state block from a prior export, kept raw until decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl Report {
    /// Create an empty report with fresh metadata
    pub fn new(title: impl Into<String>, case_id: impl Into<String>) -> Self {
        Self {
            meta: ReportMeta::new(title, case_id),
            fields: Vec::new(),
            resources: Vec::new(),
            state: None,
        }
    }

    /// Parse a report from JSON text
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the report to compact JSON
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the report to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a report from a file
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Save the report to a file
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let content = self.to_json_pretty()?;
        std::fs::write(path, content).map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Look up a field mutably by key
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    /// Decode the embedded state block, if present and well-formed
    pub fn embedded_state(&self) -> Option<StateBlock> {
        self.state.as_ref().and_then(StateBlock::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_json_round_trip() {
        let mut report = Report::new("Tumor Panel", "CASE-042");
        report.meta.namespace_id = Some("ns-1".to_string());
        report.fields.push(Field::select(
            "tier.BRAF_V600E",
            vec!["1".into(), "2".into(), "3".into(), "4".into()],
            "3",
        ));
        report.fields.push(Field::note("note.summary"));
        report.resources.push(Resource {
            name: "styles".to_string(),
            media_type: "text/css".to_string(),
            href: Some("report.css".to_string()),
            content: None,
        });

        let json = report.to_json_pretty().unwrap();
        let parsed = Report::from_json(&json).unwrap();

        assert_eq!(parsed.meta.case_id, "CASE-042");
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.resources.len(), 1);
        assert!(matches!(
            parsed.field("tier.BRAF_V600E").unwrap().kind,
            FieldKind::Select { .. }
        ));
    }

    #[test]
    fn test_state_block_canonical_shape() {
        let value = json!({ "entries": { "note.summary": "hello", "tier.x": "1" } });
        let block = StateBlock::decode(&value).unwrap();
        assert_eq!(block.entries.len(), 2);
        assert_eq!(block.entries["note.summary"], "hello");
    }

    #[test]
    fn test_state_block_legacy_pair_list() {
        let value = json!([["note.summary", "hello"], ["tier.x", "1"]]);
        let block = StateBlock::decode(&value).unwrap();
        assert_eq!(block.entries.len(), 2);
        assert_eq!(block.entries["tier.x"], "1");
    }

    #[test]
    fn test_state_block_legacy_single_pair() {
        let value = json!(["note.summary", "hello"]);
        let block = StateBlock::decode(&value).unwrap();
        assert_eq!(block.entries.len(), 1);
        assert_eq!(block.entries["note.summary"], "hello");
    }

    #[test]
    fn test_state_block_malformed_is_none() {
        assert!(StateBlock::decode(&json!(42)).is_none());
        assert!(StateBlock::decode(&json!("not a block")).is_none());
        assert!(StateBlock::decode(&json!({ "wrong": "shape" })).is_none());
        assert!(StateBlock::decode(&json!([["key", "value", "extra"]])).is_none());
    }

    #[test]
    fn test_malformed_state_does_not_block_report_load() {
        let json = r#"{
            "meta": { "title": "T", "case_id": "C", "created": "2024-01-01T00:00:00Z" },
            "fields": [],
            "state": { "unexpected": [1, 2, 3] }
        }"#;

        let report = Report::from_json(json).unwrap();
        assert!(report.state.is_some());
        assert!(report.embedded_state().is_none());
    }

    #[test]
    fn test_field_constructors() {
        let select = Field::select("tier.x", vec!["1".into(), "2".into()], "2");
        assert_eq!(select.value, "2");

        let text = Field::text("interp.x", "rendered interpretation");
        assert_eq!(text.value, "rendered interpretation");

        let note = Field::note("note.x");
        assert!(note.value.is_empty());
    }

    #[test]
    fn test_field_lookup() {
        let mut report = Report::new("T", "C");
        report.fields.push(Field::note("note.a"));

        assert!(report.field("note.a").is_some());
        assert!(report.field("note.b").is_none());

        report.field_mut("note.a").unwrap().value = "edited".to_string();
        assert_eq!(report.field("note.a").unwrap().value, "edited");
    }
}
