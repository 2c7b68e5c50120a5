//! Configuration section definitions.
//!
//! Each module corresponds to a section in `iconshelf.toml`:
//!
//! | Module    | TOML Section  | Purpose                               |
//! |-----------|---------------|---------------------------------------|
//! | `storage` | `[storage]`   | Where imported icon folders live      |
//! | `scan`    | `[scan]`      | File filters and scan concurrency     |
//! | `svg`     | `[svg]`       | Normalization rules                   |
//! | `import`  | `[import]`    | Import behaviour                      |
//! | `shell`   | `[shell]`     | Host integration (drag icon)          |

mod import;
mod scan;
mod shell;
mod storage;
mod svg;

pub use import::ImportConfig;
pub use scan::ScanConfig;
pub use shell::ShellConfig;
pub use storage::{StorageConfig, default_storage_root};
pub use svg::SvgConfig;
