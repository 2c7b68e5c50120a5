//! Catalog entry types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Serialize, Serializer};

use super::error::ErrorKind;
use crate::utils::date::DateTimeUtc;

/// Metadata and normalized content for one cataloged SVG file.
///
/// Records are snapshots: fields are only readable, a rescan produces
/// new records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconRecord {
    name: String,
    size: u64,
    #[serde(serialize_with = "serialize_date")]
    date: SystemTime,
    author: String,
    #[serde(serialize_with = "serialize_path")]
    storage: PathBuf,
    #[serde(serialize_with = "serialize_path")]
    path: PathBuf,
    icon: String,
}

impl IconRecord {
    /// Build a record for `path`, deriving `name` and `author` from it.
    pub fn new(storage: &Path, path: PathBuf, size: u64, date: SystemTime, icon: String) -> Self {
        Self {
            name: file_name_of(&path),
            author: author_of(&path),
            size,
            date,
            storage: storage.to_path_buf(),
            path,
            icon,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    pub const fn date(&self) -> SystemTime {
        self.date
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn storage(&self) -> &Path {
        &self.storage
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// `author/name`, the short selector used by the CLI.
    pub fn label(&self) -> String {
        format!("{}/{}", self.author, self.name)
    }
}

/// A file that was enumerated but could not be cataloged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Records plus the files skipped while building them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub icons: Vec<IconRecord>,
    pub skipped: Vec<SkippedFile>,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Basename of the immediate parent directory.
pub fn author_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn serialize_date<S: Serializer>(date: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&DateTimeUtc::from_system_time(*date).to_rfc3339())
}

fn serialize_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}
