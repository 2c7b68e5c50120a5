//! Command-line interface module.

mod args;
pub mod bridge;
pub mod drag;
pub mod export;
pub mod import;
pub mod list;
mod prompt;

pub use args::{Cli, Commands, ListArgs};

use crate::library::{Failure, ShelfError};

/// Wrap a library error for display, e.g. `[error] An error occurred during import: ...`.
pub(crate) fn failure(title: &str, err: &ShelfError) -> anyhow::Error {
    anyhow::Error::new(Failure::new(title, err))
}
