//! `[scan]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scan]
//! extensions = ["svg"]     # Exact, case-insensitive match, no leading dot
//! skip_dirs = [".git"]     # Directory names never descended into
//! concurrency = 32         # Files read/normalized at once
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::library::{DEFAULT_CONCURRENCY, ScanOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            extensions: scan.extensions,
            skip_dirs: scan.skip_dirs,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self, problems: &mut Vec<String>) {
        if self.extensions.is_empty() {
            problems.push("[scan] extensions must not be empty".into());
        }
        for ext in &self.extensions {
            if ext.is_empty() || ext.starts_with('.') {
                problems.push(format!("[scan] extension `{ext}` must be non-empty and have no leading dot"));
            }
        }
        for dir in &self.skip_dirs {
            if dir.is_empty() || dir.contains(['/', '\\']) {
                problems.push(format!("[scan] skip_dirs entry `{dir}` must be a bare directory name"));
            }
        }
        if self.concurrency == 0 || self.concurrency > Semaphore::MAX_PERMITS {
            problems.push(format!(
                "[scan] concurrency must be between 1 and {}",
                Semaphore::MAX_PERMITS
            ));
        }
    }

    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            skip_dirs: self.skip_dirs.clone(),
        }
    }
}
