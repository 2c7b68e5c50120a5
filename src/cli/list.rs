//! `iconshelf list`

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

use super::{ListArgs, failure};
use crate::library::{IconRecord, Outcome, Shelf, SkippedFile};
use crate::log;
use crate::logger;
use crate::utils::date::DateTimeUtc;
use crate::utils::plural_count;

#[derive(Serialize)]
struct Listing<'a> {
    icons: Vec<&'a IconRecord>,
    skipped: &'a [SkippedFile],
}

/// Catalog storage and print it.
pub async fn run_list(shelf: &Shelf, args: &ListArgs) -> Result<()> {
    logger::status("catalog", "scanning...");
    let outcome = shelf.request_catalog().await;
    logger::clear_status();

    let report = match outcome.map_err(|e| failure("An error occurred while loading icons", &e))? {
        Outcome::Done(report) => report,
        Outcome::Cancelled => {
            log!("catalog"; "cancelled");
            return Ok(());
        }
    };

    let icons: Vec<&IconRecord> = report
        .icons
        .iter()
        .filter(|icon| args.author.as_deref().is_none_or(|author| icon.author() == author))
        .collect();

    let mut out = io::stdout().lock();
    if args.json {
        let listing = Listing {
            icons,
            skipped: &report.skipped,
        };
        let json = if args.pretty {
            serde_json::to_string_pretty(&listing)?
        } else {
            serde_json::to_string(&listing)?
        };
        writeln!(out, "{json}")?;
        return Ok(());
    }

    write!(out, "{}", render_table(&icons))?;
    out.flush()?;

    log!(
        "catalog";
        "{} in {}",
        plural_count(icons.len(), "icon"),
        shelf.storage_root().display()
    );
    if !report.skipped.is_empty() {
        log!("catalog"; "skipped {}", plural_count(report.skipped.len(), "unreadable file"));
    }
    Ok(())
}

/// One line per icon: date, size, `author/name`.
fn render_table(icons: &[&IconRecord]) -> String {
    let width = icons
        .iter()
        .map(|icon| icon.size().to_string().len())
        .max()
        .unwrap_or(0);

    icons
        .iter()
        .map(|icon| {
            format!(
                "{}  {:>width$}  {}\n",
                DateTimeUtc::from_system_time(icon.date()).to_short(),
                icon.size(),
                icon.label(),
            )
        })
        .collect()
}
