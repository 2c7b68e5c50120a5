//! The icon library: scanning, normalizing, cataloging and importing.
//!
//! | Module      | Purpose                                              |
//! |-------------|------------------------------------------------------|
//! | `normalize` | Strip sizing and denylisted attributes from SVG      |
//! | `scan`      | Recursive enumeration of icon files                  |
//! | `catalog`   | Build [`IconRecord`]s concurrently                   |
//! | `import`    | Copy a folder into storage and catalog it            |
//! | `lock`      | Per-storage-root reader/writer locks                 |
//! | `shelf`     | Front-end requests over all of the above             |

mod catalog;
pub mod error;
mod import;
mod lock;
mod normalize;
mod record;
mod scan;
mod shelf;

pub use catalog::{CatalogOptions, DEFAULT_CONCURRENCY, build_catalog, build_catalog_in};
pub use error::{ErrorKind, Failure, Outcome, Result, ShelfError};
pub use import::{ImportOptions, import_directory, import_directory_with};
pub use lock::StorageLocks;
pub use normalize::{NormalizeOptions, normalize, normalize_with};
pub use record::{CatalogReport, IconRecord, SkippedFile};
pub use scan::{ScanOptions, SvgFiles, collect_svg_files, enumerate, matches_extension};
pub use shelf::{Chosen, DirectoryPicker, DragSource, SavePathPicker, Shelf, export_target, select};
