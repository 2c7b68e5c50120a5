//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted output with colored prefixes
//! - `debug!` macro, only active with `--verbose`
//! - `status` for a transient single-line message (e.g. "scanning...")
//!
//! Everything goes to stderr: stdout carries listings and bridge events.
//!
//! # Example
//!
//! ```ignore
//! log!("import"; "{} -> {}", source.display(), dest.display());
//! status("catalog", "scanning...");   // overwritten by the next line
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream};
use std::{
    io::{IsTerminal, Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// A transient status line is currently on screen
static STATUS_SHOWN: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let mut err = stderr().lock();

    if STATUS_SHOWN.swap(false, Ordering::SeqCst) {
        execute!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(err, "{prefix} {message}").ok();
    err.flush().ok();
}

/// Show a single-line status that the next log line replaces.
///
/// Skipped when stderr is not a terminal.
pub fn status(module: &str, message: &str) {
    let mut err = stderr().lock();
    if !err.is_terminal() {
        return;
    }

    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    execute!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    write!(err, "{prefix} {}", message.if_supports_color(Stream::Stderr, |m| m.dimmed())).ok();
    err.flush().ok();
    STATUS_SHOWN.store(true, Ordering::SeqCst);
}

/// Remove the status line, if any.
pub fn clear_status() {
    if STATUS_SHOWN.swap(false, Ordering::SeqCst) {
        let mut err = stderr().lock();
        execute!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        err.flush().ok();
    }
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    let out = Stream::Stderr;
    match module_lower {
        "catalog" | "bridge" => prefix.if_supports_color(out, |p| p.bright_blue().bold().to_string()).to_string(),
        "import" | "export" => prefix.if_supports_color(out, |p| p.bright_green().bold().to_string()).to_string(),
        "error" => prefix.if_supports_color(out, |p| p.bright_red().bold().to_string()).to_string(),
        _ => prefix.if_supports_color(out, |p| p.bright_yellow().bold().to_string()).to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
