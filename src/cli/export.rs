//! `iconshelf export`

use anyhow::Result;
use std::path::Path;

use super::failure;
use super::prompt::{TerminalPicker, confirm};
use crate::library::{Chosen, Outcome, SavePathPicker, Shelf, export_target};
use crate::log;

const TITLE: &str = "An error occurred during export";

/// Write the selected icon's normalized SVG to `output` (or a prompted path).
pub async fn run_export(shelf: &Shelf, selector: &str, output: Option<&Path>, force: bool) -> Result<()> {
    let record = match shelf.find_record(selector).await.map_err(|e| failure(TITLE, &e))? {
        Outcome::Done(record) => record,
        Outcome::Cancelled => {
            log!("export"; "cancelled");
            return Ok(());
        }
    };

    let picked = match output {
        Some(path) => Some(path.to_path_buf()),
        None => TerminalPicker.pick_save_path(record.name()).done(),
    };
    // resolved here too so the overwrite question names the real file
    let target = match picked {
        Some(path) => Some(export_target(&record, path).await),
        None => None,
    };

    if let Some(path) = &target
        && path.exists()
        && !force
        && !confirm(&format!("Overwrite {}?", path.display()))?
    {
        log!("export"; "cancelled");
        return Ok(());
    }

    let outcome = shelf
        .request_export(&record, &Chosen(target))
        .await
        .map_err(|e| failure(TITLE, &e))?;
    if outcome.is_cancelled() {
        log!("export"; "cancelled");
    }
    Ok(())
}
