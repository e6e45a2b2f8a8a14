//! Reset command handler

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::output::Output;
use crate::session::Session;

/// Clear every annotation in the report's namespace
///
/// Prompts for confirmation on an interactive terminal unless `--yes` was
/// given. On failure the store is reported as unchanged and the error is
/// surfaced; the reload afterwards shows whatever state remains.
pub async fn reset(path: &Path, yes: bool, output: &Output) -> Result<()> {
    let mut session = Session::open(path).await?;

    if session.store.is_empty() {
        output.message("No annotations to reset.");
        return Ok(());
    }

    if !yes && output.should_prompt() && atty::is(atty::Stream::Stdin) {
        print!(
            "Reset {} annotation(s) for namespace {}? [y/N] ",
            session.store.len(),
            session.store.namespace()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !matches!(input.trim(), "y" | "Y" | "yes") {
            output.message("Aborted.");
            return Ok(());
        }
    }

    session
        .store
        .reset_namespace()
        .await
        .context("Reset failed; annotations were left as-is")?;

    // Full reload of the document instance follows a reset
    session.store.load_namespace().await;

    output.success("Annotations reset.");
    Ok(())
}
