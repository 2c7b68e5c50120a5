//! `[storage]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! root = "~/Icons"    # `~` is expanded; relative paths are relative to the config file
//! ```
//!
//! Without `root`, icons live in `<platform data dir>/iconshelf/Icons`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root. Empty means the platform default.
    pub root: PathBuf,
}

/// `<data dir>/iconshelf/Icons`, if the platform has a data dir.
pub fn default_storage_root() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("iconshelf").join("Icons"))
}
