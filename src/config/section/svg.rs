//! `[svg]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [svg]
//! remove_dimensions = true    # Drop width/height on the root <svg>
//! remove_attrs = ["class"]    # Attributes removed from every element
//! ```

use serde::{Deserialize, Serialize};

use crate::library::NormalizeOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub remove_dimensions: bool,
    pub remove_attrs: Vec<String>,
}

impl Default for SvgConfig {
    fn default() -> Self {
        let normalize = NormalizeOptions::default();
        Self {
            remove_dimensions: normalize.remove_dimensions,
            remove_attrs: normalize.remove_attrs,
        }
    }
}

impl SvgConfig {
    pub fn options(&self) -> NormalizeOptions {
        NormalizeOptions {
            remove_dimensions: self.remove_dimensions,
            remove_attrs: self.remove_attrs.clone(),
        }
    }
}
