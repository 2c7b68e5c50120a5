//! `[import]` section configuration.
//!
//! ```toml
//! [import]
//! rollback = true    # Remove the partial copy when an import fails
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub rollback: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { rollback: true }
    }
}
