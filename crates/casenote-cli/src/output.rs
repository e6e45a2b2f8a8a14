//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use casenote_core::{AnnotationStore, FieldKind, Report};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a report with the store's annotations applied
    pub fn print_report(&self, report: &Report, store: &AnnotationStore) {
        match self.format {
            OutputFormat::Human => {
                println!("{} ({})", report.meta.title, report.meta.case_id);
                println!("Namespace: {}", store.namespace());
                println!();

                if report.fields.is_empty() {
                    println!("No annotatable fields.");
                    return;
                }

                for field in &report.fields {
                    let value = store.get(&field.key, &field.value);
                    let annotated = store.get_opt(&field.key).is_some();
                    let kind = match &field.kind {
                        FieldKind::Select { .. } => "select",
                        FieldKind::Text { .. } => "text",
                        FieldKind::Note => "note",
                    };
                    println!(
                        "{} [{}]{}",
                        field.key,
                        kind,
                        if annotated { " *" } else { "" }
                    );
                    if !value.is_empty() {
                        println!("  {}", truncate_line(&value, 76));
                    }
                }
                println!();
                println!(
                    "{} field(s), {} annotation(s)",
                    report.fields.len(),
                    store.len()
                );
            }
            OutputFormat::Json => {
                let fields: Vec<_> = report
                    .fields
                    .iter()
                    .map(|field| {
                        serde_json::json!({
                            "key": field.key,
                            "value": store.get(&field.key, &field.value),
                            "annotated": store.get_opt(&field.key).is_some(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "title": report.meta.title,
                        "case_id": report.meta.case_id,
                        "namespace": store.namespace(),
                        "fields": fields,
                    })
                );
            }
            OutputFormat::Quiet => {
                for field in &report.fields {
                    println!("{}", field.key);
                }
            }
        }
    }

    /// Print a single entry value
    pub fn print_entry(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Human => println!("{} = {}", key, value),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "key": key, "value": value }));
            }
            OutputFormat::Quiet => println!("{}", value),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
///
/// Cuts on char boundaries: annotation values are arbitrary reviewer text,
/// so a byte-offset slice could land inside a multi-byte character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
