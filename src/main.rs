//! iconshelf - import, catalog and export SVG icon collections.

// `library` is a public API; the CLI uses only part of it.
#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod library;
mod logger;
mod utils;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ShelfConfig;
use library::Shelf;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Setup global Ctrl+C handler (before any blocking operations)
    let cancel = core::CancelToken::new();
    core::setup_shutdown_handler(cancel.clone())?;

    let config = ShelfConfig::load(&cli)?;
    let shelf = Shelf::new(&config, cancel);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let result = rt.block_on(dispatch(&cli.command, &shelf));

    // stdin reads in `bridge` may still be parked on a blocking thread
    rt.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn dispatch(command: &Commands, shelf: &Shelf) -> Result<()> {
    match command {
        Commands::List { args } => cli::list::run_list(shelf, args).await,
        Commands::Import { source } => cli::import::run_import(shelf, source.as_deref()).await,
        Commands::Export {
            selector,
            output,
            force,
        } => cli::export::run_export(shelf, selector, output.as_deref(), *force).await,
        Commands::Drag { selector } => cli::drag::run_drag(shelf, selector).await,
        Commands::Bridge => cli::bridge::run_bridge(shelf).await,
    }
}
