//! The shelf service: the requests a front-end can make.
//!
//! One [`Shelf`] exists per process. It owns the storage root, the
//! options derived from configuration, the storage locks and the
//! cancellation token. Dialogs and drag-and-drop belong to the host; the
//! shelf only talks to them through [`DirectoryPicker`],
//! [`SavePathPicker`] and [`DragSource`].

use std::path::{Component, Path, PathBuf};

use super::catalog::{CatalogOptions, build_catalog_in};
use super::error::{Outcome, Result, ShelfError};
use super::import::{ImportOptions, import_directory_with};
use super::lock::StorageLocks;
use super::record::{CatalogReport, IconRecord};
use super::scan::matches_extension;
use crate::config::ShelfConfig;
use crate::core::CancelToken;
use crate::utils::path::normalize_path;
use crate::{debug, log};

// ============================================================================
// Host collaborators
// ============================================================================

/// Asks the user for a directory to import.
pub trait DirectoryPicker {
    fn pick_directory(&self) -> Outcome<PathBuf>;
}

/// Asks the user where to save an exported icon.
pub trait SavePathPicker {
    /// `suggested_name` is the icon's file name.
    fn pick_save_path(&self, suggested_name: &str) -> Outcome<PathBuf>;
}

/// Starts a native drag of a file out of the application.
pub trait DragSource {
    fn start_drag(&self, file: &Path, icon: Option<&Path>) -> Result<()>;
}

/// A choice that was already made, e.g. passed on the command line.
///
/// `None` means the user dismissed the dialog.
#[derive(Debug, Clone, Default)]
pub struct Chosen(pub Option<PathBuf>);

impl DirectoryPicker for Chosen {
    fn pick_directory(&self) -> Outcome<PathBuf> {
        self.0.clone().map_or(Outcome::Cancelled, Outcome::Done)
    }
}

impl SavePathPicker for Chosen {
    fn pick_save_path(&self, _suggested_name: &str) -> Outcome<PathBuf> {
        self.0.clone().map_or(Outcome::Cancelled, Outcome::Done)
    }
}

// ============================================================================
// Shelf
// ============================================================================

#[derive(Debug)]
pub struct Shelf {
    storage_root: PathBuf,
    import: ImportOptions,
    drag_icon: Option<PathBuf>,
    locks: StorageLocks,
    cancel: CancelToken,
}

impl Shelf {
    pub fn new(config: &ShelfConfig, cancel: CancelToken) -> Self {
        Self {
            storage_root: config.storage.root.clone(),
            import: config.import_options(),
            drag_icon: config.shell.drag_icon.clone(),
            locks: StorageLocks::new(),
            cancel,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn catalog_options(&self) -> &CatalogOptions {
        &self.import.catalog
    }

    /// Create the storage root if needed and catalog all of it.
    pub async fn request_catalog(&self) -> Result<Outcome<CatalogReport>> {
        self.bootstrap().await?;
        let _guard = self.locks.read(&self.storage_root).await;
        build_catalog_in(
            &self.storage_root,
            &self.storage_root,
            self.catalog_options(),
            &self.cancel,
        )
        .await
    }

    /// Import the directory the picker returns.
    ///
    /// The report only covers the imported folder.
    pub async fn request_import(&self, picker: &dyn DirectoryPicker) -> Result<Outcome<CatalogReport>> {
        let Outcome::Done(source) = picker.pick_directory() else {
            debug!("import"; "no directory chosen");
            return Ok(Outcome::Cancelled);
        };

        self.bootstrap().await?;
        let _guard = self.locks.write(&self.storage_root).await;
        import_directory_with(&source, &self.storage_root, &self.import, &self.cancel).await
    }

    /// Save the record's normalized SVG to the path the picker returns.
    ///
    /// A directory target keeps the icon's own file name.
    pub async fn request_export(
        &self,
        record: &IconRecord,
        picker: &dyn SavePathPicker,
    ) -> Result<Outcome<PathBuf>> {
        let Outcome::Done(picked) = picker.pick_save_path(record.name()) else {
            return Ok(Outcome::Cancelled);
        };
        let target = export_target(record, picked).await;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelfError::io(parent, e))?;
        }
        tokio::fs::write(&target, record.icon())
            .await
            .map_err(|e| ShelfError::io(&target, e))?;

        log!("export"; "{} -> {}", record.label(), target.display());
        Ok(Outcome::Done(target))
    }

    /// Hand a cataloged file to the host's drag source.
    pub fn request_drag_start(&self, path: &Path, drag: &dyn DragSource) -> Result<()> {
        let file = self.resolve_icon_file(path)?;
        drag.start_drag(&file, self.drag_icon.as_deref())
    }

    /// Catalog the storage root and look a record up by selector.
    ///
    /// See [`select`] for the accepted selector forms.
    pub async fn find_record(&self, selector: &str) -> Result<Outcome<IconRecord>> {
        let report = match self.request_catalog().await? {
            Outcome::Done(report) => report,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        select(&report.icons, selector)
            .cloned()
            .map(Outcome::Done)
            .ok_or_else(|| ShelfError::NotFound(selector.to_string()))
    }

    async fn bootstrap(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.storage_root)
            .await
            .map_err(|e| ShelfError::io(&self.storage_root, e))
    }

    /// An existing icon file below the storage root.
    ///
    /// A symlink that lives in storage counts as inside even when its
    /// target does not; the catalog lists it under its link path.
    fn resolve_icon_file(&self, path: &Path) -> Result<PathBuf> {
        let meta = std::fs::metadata(path).map_err(|e| ShelfError::io(path, e))?;
        let resolved = normalize_path(path);
        let file = if resolved.starts_with(normalize_path(&self.storage_root)) {
            resolved
        } else if self.lexically_inside(path) {
            path.to_path_buf()
        } else {
            return Err(ShelfError::OutsideStorage(path.to_path_buf()));
        };

        let extensions = &self.catalog_options().scan.extensions;
        let is_icon = file
            .file_name()
            .is_some_and(|name| matches_extension(name, extensions));
        if !meta.is_file() || !is_icon {
            return Err(ShelfError::NotFound(path.display().to_string()));
        }
        Ok(file)
    }

    /// `path` names an entry below the storage root without following links.
    fn lexically_inside(&self, path: &Path) -> bool {
        path.is_absolute()
            && !path.components().any(|c| c == Component::ParentDir)
            && path.starts_with(&self.storage_root)
    }
}

/// Where an export chosen as `picked` ends up.
pub async fn export_target(record: &IconRecord, picked: PathBuf) -> PathBuf {
    match tokio::fs::metadata(&picked).await {
        Ok(meta) if meta.is_dir() => picked.join(record.name()),
        _ => picked,
    }
}

/// Find a record by full path or by `author/name`.
///
/// A label shared by several records resolves to the first by path.
pub fn select<'a>(icons: &'a [IconRecord], selector: &str) -> Option<&'a IconRecord> {
    let raw = Path::new(selector);
    let as_path = normalize_path(raw);
    if let Some(record) = icons.iter().find(|r| r.path() == raw || r.path() == as_path) {
        return Some(record);
    }

    let mut matches = icons.iter().filter(|r| r.label() == selector);
    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        log!("shelf"; "`{}` matches {} icons, using {}", selector, others + 1, first.path().display());
    }
    Some(first)
}
