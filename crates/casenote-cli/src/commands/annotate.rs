//! Annotation command handlers (get/set/remove)
//!
//! These commands are the CLI's rendition of the collaborator contract: UI
//! components read with `get(key, fallback)` and write with fire-and-forget
//! `set`/`remove`. The store core never initiates edits itself.

use std::path::Path;

use anyhow::{bail, Result};

use casenote_core::{RevisionMarker, REVISION_KEY};

use crate::output::Output;
use crate::session::Session;

/// Read one annotation value
///
/// Falls back to the field's rendered value when the key names a report
/// field, otherwise to the explicit `fallback`.
pub async fn get(path: &Path, key: String, fallback: String, output: &Output) -> Result<()> {
    let session = Session::open(path).await?;

    let fallback = session
        .report
        .field(&key)
        .map(|f| f.value.clone())
        .unwrap_or(fallback);

    let value = session.store.get(&key, &fallback);
    output.print_entry(&key, &value);
    Ok(())
}

/// Write one annotation value
pub async fn set(path: &Path, key: String, value: String, output: &Output) -> Result<()> {
    if key == REVISION_KEY {
        bail!("'{}' is reserved for the revision marker", key);
    }

    let mut session = Session::open_mut(path).await?;

    session.store.set(&key, &value).await;
    // Every edit advances the revision, so legacy inline state can never
    // supersede a store that has seen newer activity
    session
        .store
        .set(REVISION_KEY, RevisionMarker::now().as_str())
        .await;

    if !session.store.is_durable() {
        output.message("Note: annotation storage is unavailable; this edit is session-only.");
    }
    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

/// Remove one annotation, reverting the field to its baseline
pub async fn remove(path: &Path, key: String, output: &Output) -> Result<()> {
    let mut session = Session::open_mut(path).await?;

    session.store.remove(&key).await;
    session
        .store
        .set(REVISION_KEY, RevisionMarker::now().as_str())
        .await;

    output.success(&format!("Removed {}", key));
    Ok(())
}
