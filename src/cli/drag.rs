//! `iconshelf drag`
//!
//! A terminal has no drag-and-drop, so the "drag" prints the file path on
//! stdout for the next program in the pipe (e.g. a drag helper).

use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

use super::failure;
use crate::library::{self, DragSource, Outcome, Shelf, ShelfError};
use crate::{debug, log};

const TITLE: &str = "An error occurred while dragging";

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutDrag;

impl DragSource for StdoutDrag {
    fn start_drag(&self, file: &Path, icon: Option<&Path>) -> library::Result<()> {
        if let Some(icon) = icon {
            debug!("drag"; "drag icon {}", icon.display());
        }
        let mut out = io::stdout().lock();
        writeln!(out, "{}", file.display())
            .and_then(|()| out.flush())
            .map_err(|e| ShelfError::Io(file.to_path_buf(), e))
    }
}

pub async fn run_drag(shelf: &Shelf, selector: &str) -> Result<()> {
    let record = match shelf.find_record(selector).await.map_err(|e| failure(TITLE, &e))? {
        Outcome::Done(record) => record,
        Outcome::Cancelled => {
            log!("drag"; "cancelled");
            return Ok(());
        }
    };

    shelf
        .request_drag_start(record.path(), &StdoutDrag)
        .map_err(|e| failure(TITLE, &e))?;
    debug!("drag"; "{}", record.label());
    Ok(())
}
