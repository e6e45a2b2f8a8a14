//! Status command handler

use std::path::Path;

use anyhow::Result;

use crate::output::Output;
use crate::session::Session;

/// Show status information for a report
pub async fn show(path: &Path, output: &Output) -> Result<()> {
    let session = Session::open(path).await?;
    let store = &session.store;
    let config = &session.config;

    let revision = store.revision().map(|r| r.to_string());
    let db_size = std::fs::metadata(config.sqlite_path())
        .map(|m| m.len())
        .unwrap_or(0);

    match output.format {
        crate::output::OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "case_id": session.report.meta.case_id,
                    "namespace": store.namespace(),
                    "durable": store.is_durable(),
                    "annotations": store.len(),
                    "revision": revision,
                    "storage": {
                        "location": config.data_dir,
                        "database_size": db_size,
                    }
                })
            );
        }
        crate::output::OutputFormat::Quiet => {
            println!("{}", store.namespace());
        }
        crate::output::OutputFormat::Human => {
            println!("casenote Status");
            println!("===============");
            println!();
            println!("Report:");
            println!("  Case:      {}", session.report.meta.case_id);
            println!("  Namespace: {}", store.namespace());
            println!();
            println!("Annotations:");
            println!("  Entries:  {}", store.len());
            println!(
                "  Revision: {}",
                revision.as_deref().unwrap_or("(none)")
            );
            println!(
                "  Durable:  {}",
                if store.is_durable() {
                    "yes"
                } else {
                    "no (session-only)"
                }
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Size:     {} bytes", db_size);
        }
    }

    Ok(())
}
