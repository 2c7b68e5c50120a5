//! Library error types.
//!
//! Every failure carries an [`ErrorKind`] so the bridge can transmit it
//! alongside the human-readable message.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// ErrorKind
// ============================================================================

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    PathNotFound,
    PermissionDenied,
    DestinationExists,
    MalformedSvg,
    CopyFailed,
    NotADirectory,
    InvalidSource,
    OutsideStorage,
    NotFound,
    Io,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathNotFound => "PathNotFound",
            Self::PermissionDenied => "PermissionDenied",
            Self::DestinationExists => "DestinationExists",
            Self::MalformedSvg => "MalformedSvg",
            Self::CopyFailed => "CopyFailed",
            Self::NotADirectory => "NotADirectory",
            Self::InvalidSource => "InvalidSource",
            Self::OutsideStorage => "OutsideStorage",
            Self::NotFound => "NotFound",
            Self::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ShelfError
// ============================================================================

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf, #[source] io::Error),

    #[error("destination folder already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("malformed SVG in {}: {reason}", .path.display())]
    MalformedSvg { path: PathBuf, reason: String },

    #[error("failed to copy {} to {}{}", .from.display(), .to.display(), rollback_note(.rolled_back))]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        rolled_back: bool,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid import source {}: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: &'static str },

    #[error("{} is not inside the storage root", .0.display())]
    OutsideStorage(PathBuf),

    #[error("no icon matches `{0}`")]
    NotFound(String),

    #[error("IO error on {}", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        " (partial copy removed)"
    } else {
        " (partial copy left in place)"
    }
}

impl ShelfError {
    /// Classify an I/O error raised while touching `path`.
    pub fn io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::PathNotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path, err),
            _ => Self::Io(path, err),
        }
    }

    pub fn malformed(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::MalformedSvg {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::PermissionDenied(..) => ErrorKind::PermissionDenied,
            Self::DestinationExists(_) => ErrorKind::DestinationExists,
            Self::MalformedSvg { .. } => ErrorKind::MalformedSvg,
            Self::CopyFailed { .. } => ErrorKind::CopyFailed,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::InvalidSource { .. } => ErrorKind::InvalidSource,
            Self::OutsideStorage(_) => ErrorKind::OutsideStorage,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(..) => ErrorKind::Io,
        }
    }
}

pub type Result<T, E = ShelfError> = std::result::Result<T, E>;

// ============================================================================
// Outcome
// ============================================================================

/// Result of a user-facing request that the user may abort.
///
/// Cancellation is neither success nor failure: it has no side effects
/// and is reported separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Cancelled => Outcome::Cancelled,
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

// ============================================================================
// Failure
// ============================================================================

/// A failure as presented to the user: short title plus message text.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub title: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(title: impl Into<String>, err: &ShelfError) -> Self {
        Self {
            title: title.into(),
            kind: err.kind(),
            message: error_chain(err),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl std::error::Error for Failure {}

/// Render an error with its sources joined by `: `.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
