//! `[shell]` section configuration.
//!
//! ```toml
//! [shell]
//! drag_icon = "assets/drag.png"    # Image shown under the cursor while dragging
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub drag_icon: Option<PathBuf>,
}
