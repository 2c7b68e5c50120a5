//! `iconshelf import`

use anyhow::Result;
use std::path::Path;

use super::failure;
use super::prompt::TerminalPicker;
use crate::library::{Chosen, DirectoryPicker, Outcome, Shelf};
use crate::utils::plural_count;
use crate::{debug, log};

/// Import `source`, or ask for a folder when none is given.
pub async fn run_import(shelf: &Shelf, source: Option<&Path>) -> Result<()> {
    let chosen;
    let picker: &dyn DirectoryPicker = match source {
        Some(path) => {
            chosen = Chosen(Some(path.to_path_buf()));
            &chosen
        }
        None => &TerminalPicker,
    };

    let outcome = shelf
        .request_import(picker)
        .await
        .map_err(|e| failure("An error occurred during import", &e))?;

    let Outcome::Done(report) = outcome else {
        log!("import"; "cancelled");
        return Ok(());
    };

    for icon in &report.icons {
        debug!("import"; "{}", icon.label());
    }
    log!(
        "import";
        "added {} to {}",
        plural_count(report.icons.len(), "icon"),
        shelf.storage_root().display()
    );
    if !report.skipped.is_empty() {
        log!("import"; "skipped {}", plural_count(report.skipped.len(), "unreadable file"));
    }
    Ok(())
}
