//! Configuration management for `iconshelf.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [storage] [scan] [svg] [import] [shell]
//! ├── error          # ConfigError
//! ├── util           # config lookup, path expansion
//! └── mod.rs         # ShelfConfig (this file)
//! ```
//!
//! The file is optional: without one every section takes its defaults.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{ImportConfig, ScanConfig, ShellConfig, StorageConfig, SvgConfig};

use section::default_storage_root;
use util::{expand_path, find_config_file};

use crate::cli::Cli;
use crate::library::{CatalogOptions, ImportOptions};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing iconshelf.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub svg: SvgConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub shell: ShellConfig,
}

impl ShelfConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file; a missing file means
    /// defaults. Relative paths in the file resolve against its directory,
    /// `--storage` against cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(crate::utils::path::normalize_path(&path));
                config
            }
            None => {
                debug!("config"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let base = config
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.finalize(&base, cli.storage.as_deref(), &cwd)?;
        config.validate()?;

        Ok(config)
    }

    /// Resolve paths and apply the CLI storage override.
    fn finalize(&mut self, base: &Path, storage_override: Option<&Path>, cwd: &Path) -> Result<()> {
        self.storage.root = match storage_override {
            Some(root) => expand_path(root, cwd),
            None if self.storage.root.as_os_str().is_empty() => default_storage_root()
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "no platform data directory, set [storage] root or pass --storage".into(),
                    )
                })?,
            None => expand_path(&self.storage.root, base),
        };

        if let Some(icon) = self.shell.drag_icon.take() {
            self.shell.drag_icon = Some(expand_path(&icon, base));
        }
        Ok(())
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Validate configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        self.scan.validate(&mut problems);

        if let Some(icon) = &self.shell.drag_icon
            && !icon.is_file()
        {
            log!("warning"; "[shell] drag_icon `{}` does not exist", icon.display());
        }

        match ConfigError::from_problems(&problems) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            scan: self.scan.options(),
            normalize: self.svg.options(),
            concurrency: self.scan.concurrency,
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            catalog: self.catalog_options(),
            rollback: self.import.rollback,
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ShelfConfig {
    let (parsed, ignored) = ShelfConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) =
            ShelfConfig::parse_with_ignored("[scan]\nextension = [\"svg\"]\n[colour]\nx = 1").unwrap();
        assert_eq!(ignored, vec!["scan.extension", "colour"]);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ShelfConfig::parse_with_ignored("[scan\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_finalize_resolves_relative_root() {
        let dir = TempDir::new().unwrap();
        let base = normalize_path(dir.path());
        let mut config = test_parse_config("[storage]\nroot = \"Icons\"\n[shell]\ndrag_icon = \"drag.png\"");

        config.finalize(&base, None, Path::new("/elsewhere")).unwrap();

        assert_eq!(config.storage.root, base.join("Icons"));
        assert_eq!(config.shell.drag_icon, Some(base.join("drag.png")));
    }

    #[test]
    fn test_storage_override_wins() {
        let dir = TempDir::new().unwrap();
        let cwd = normalize_path(dir.path());
        let mut config = test_parse_config("[storage]\nroot = \"/from/file\"");

        config
            .finalize(Path::new("/base"), Some(Path::new("mine")), &cwd)
            .unwrap();

        assert_eq!(config.storage.root, cwd.join("mine"));
    }

    #[test]
    fn test_default_root_uses_data_dir() {
        let Some(data) = dirs::data_dir() else { return };
        let mut config = ShelfConfig::default();
        config.finalize(Path::new("/base"), None, Path::new("/cwd")).unwrap();
        assert_eq!(config.storage.root, data.join("iconshelf").join("Icons"));
    }

    #[test]
    fn test_validation_rejects_bad_scan() {
        let config = test_parse_config("[scan]\nconcurrency = 0");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        assert!(ShelfConfig::default().validate().is_ok());
    }

    #[test]
    fn test_options_follow_config() {
        let config = test_parse_config(
            "[scan]\nextensions = [\"SVG\"]\nconcurrency = 2\n[svg]\nremove_attrs = [\"class\", \"style\"]\n[import]\nrollback = false",
        );
        let options = config.import_options();
        assert!(!options.rollback);
        assert_eq!(options.catalog.concurrency, 2);
        assert_eq!(options.catalog.scan.extensions, vec!["SVG"]);
        assert_eq!(options.catalog.normalize.remove_attrs, vec!["class", "style"]);
    }
}
