//! Show command handler

use std::path::Path;

use anyhow::Result;

use crate::output::Output;
use crate::session::Session;

/// Show a report with its annotations applied
pub async fn show(path: &Path, output: &Output) -> Result<()> {
    let session = Session::open(path).await?;
    output.print_report(&session.report, &session.store);
    Ok(())
}
