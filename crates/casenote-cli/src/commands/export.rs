//! Export command handler

use std::path::Path;

use anyhow::{Context, Result};

use casenote_core::export_snapshot;

use crate::output::Output;
use crate::session::Session;

/// Export the report as a self-contained artifact
///
/// Any failure aborts before the output file is touched; a partial artifact
/// is never written.
pub async fn export(path: &Path, out: &Path, output: &Output) -> Result<()> {
    let session = Session::open(path).await?;

    let resource_root = session
        .config
        .resource_dir
        .clone()
        .or_else(|| path.parent().map(|p| p.to_path_buf()));

    let bytes = export_snapshot(&session.report, &session.store, resource_root.as_deref())
        .context("Export failed; no artifact was produced")?;

    std::fs::write(out, &bytes)
        .with_context(|| format!("Failed to write artifact to {}", out.display()))?;

    output.success(&format!(
        "Exported {} ({} bytes)",
        out.display(),
        bytes.len()
    ));
    Ok(())
}
