//! Import merging.
//!
//! An import copies an external directory tree into the storage root
//! under its own folder name, then catalogs just that new subtree.
//! Imports never merge: an existing folder of the same name is a hard
//! failure and nothing is written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::catalog::{CatalogOptions, build_catalog_in};
use super::error::{Outcome, Result, ShelfError};
use super::record::{CatalogReport, IconRecord};
use crate::core::CancelToken;
use crate::utils::path::normalize_path;
use crate::{debug, log};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub catalog: CatalogOptions,
    /// Remove a partially copied destination when the copy fails.
    pub rollback: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            catalog: CatalogOptions::default(),
            rollback: true,
        }
    }
}

/// Copy `source` to `storage_root/<basename>` and catalog the copy.
pub async fn import_directory(
    source: &Path,
    storage_root: &Path,
    options: &ImportOptions,
) -> Result<Vec<IconRecord>> {
    let outcome = import_directory_with(source, storage_root, options, &CancelToken::new()).await?;
    Ok(outcome.done().map(|report| report.icons).unwrap_or_default())
}

/// Cancellable import returning the full catalog report.
///
/// Cancellation during the copy removes the partial destination (when
/// rollback is enabled). Cancellation while cataloging keeps the
/// completed copy.
pub async fn import_directory_with(
    source: &Path,
    storage_root: &Path,
    options: &ImportOptions,
    cancel: &CancelToken,
) -> Result<Outcome<CatalogReport>> {
    tokio::fs::create_dir_all(storage_root)
        .await
        .map_err(|e| ShelfError::io(storage_root, e))?;
    let (source, destination) = {
        let (src, root) = (source.to_path_buf(), storage_root.to_path_buf());
        tokio::task::spawn_blocking(move || -> Result<(PathBuf, PathBuf)> {
            let src = validate_source(&src, &root)?;
            let dst = claim_destination(&src, &root)?;
            Ok((src, dst))
        })
        .await
        .map_err(|err| ShelfError::Io(source.to_path_buf(), io::Error::other(err.to_string())))??
    };
    log!("import"; "{} -> {}", source.display(), destination.display());

    let copied = {
        let (src, dst, token) = (source.clone(), destination.clone(), cancel.clone());
        tokio::task::spawn_blocking(move || copy_tree(&src, &dst, &token))
            .await
            .map_err(|err| ShelfError::Io(destination.clone(), io::Error::other(err.to_string())))?
    };

    match copied {
        Ok(true) => {}
        Ok(false) => {
            if options.rollback {
                remove_partial(&destination);
            }
            return Ok(Outcome::Cancelled);
        }
        Err(fault) => {
            let rolled_back = options.rollback && remove_partial(&destination);
            return Err(ShelfError::CopyFailed {
                from: fault.from,
                to: fault.to,
                rolled_back,
                source: fault.source,
            });
        }
    }

    build_catalog_in(storage_root, &destination, &options.catalog, cancel).await
}

/// Resolve `source` and reject trees that cannot be imported.
fn validate_source(source: &Path, storage_root: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(source).map_err(|e| ShelfError::io(source, e))?;
    if !meta.is_dir() {
        return Err(ShelfError::NotADirectory(source.to_path_buf()));
    }

    let resolved = normalize_path(source);
    if resolved.file_name().is_none() {
        return Err(ShelfError::InvalidSource {
            path: source.to_path_buf(),
            reason: "it has no folder name",
        });
    }
    if normalize_path(storage_root).starts_with(&resolved) {
        return Err(ShelfError::InvalidSource {
            path: source.to_path_buf(),
            reason: "it contains the storage folder",
        });
    }
    Ok(resolved)
}

/// Create the empty destination folder, failing if it already exists.
///
/// `create_dir` is the atomic step: a concurrent import of the same name
/// loses with `AlreadyExists`.
fn claim_destination(source: &Path, storage_root: &Path) -> Result<PathBuf> {
    // validate_source guarantees a file name
    let name = source.file_name().unwrap_or_default();
    let destination = storage_root.join(name);

    if destination.symlink_metadata().is_ok() {
        return Err(ShelfError::DestinationExists(destination));
    }
    match fs::create_dir(&destination) {
        Ok(()) => Ok(destination),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(ShelfError::DestinationExists(destination))
        }
        Err(e) => Err(ShelfError::io(&destination, e)),
    }
}

struct CopyFault {
    from: PathBuf,
    to: PathBuf,
    source: io::Error,
}

impl CopyFault {
    fn new(from: &Path, to: &Path, source: io::Error) -> Self {
        Self {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }
}

/// Recursively copy the contents of `src` into the existing `dst`.
///
/// Returns `Ok(false)` when cancelled. Symlinked files are copied by
/// content; symlinked directories are skipped.
fn copy_tree(src: &Path, dst: &Path, cancel: &CancelToken) -> std::result::Result<bool, CopyFault> {
    let entries = fs::read_dir(src).map_err(|e| CopyFault::new(src, dst, e))?;

    for entry in entries {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let entry = entry.map_err(|e| CopyFault::new(src, dst, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| CopyFault::new(&from, &to, e))?;

        if file_type.is_dir() {
            fs::create_dir(&to).map_err(|e| CopyFault::new(&from, &to, e))?;
            if !copy_tree(&from, &to, cancel)? {
                return Ok(false);
            }
            continue;
        }

        if file_type.is_symlink() && fs::metadata(&from).is_ok_and(|m| m.is_dir()) {
            debug!("import"; "skipping symlinked directory {}", from.display());
            continue;
        }

        fs::copy(&from, &to).map_err(|e| CopyFault::new(&from, &to, e))?;
        debug!("import"; "{}", to.display());
    }

    Ok(true)
}

/// Best-effort removal of a partial copy. Returns whether it is gone.
fn remove_partial(destination: &Path) -> bool {
    match fs::remove_dir_all(destination) {
        Ok(()) => true,
        Err(err) => {
            log!("import"; "failed to remove partial copy {}: {}", destination.display(), err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::error::ErrorKind;
    use tempfile::TempDir;

    const ICON: &str = r#"<svg width="10" height="10"><rect class="x" width="5" height="5"/></svg>"#;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        storage: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("incoming/MyIcons");
        let storage = dir.path().join("Icons");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&storage).unwrap();
        fs::write(source.join("a.svg"), ICON).unwrap();
        fs::write(source.join("b.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
        Fixture {
            source,
            storage,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_import_copies_everything_and_catalogs_svgs() {
        let fx = fixture();

        let records = import_directory(&fx.source, &fx.storage, &ImportOptions::default())
            .await
            .unwrap();

        let dest = fx.storage.join("MyIcons");
        assert!(dest.join("a.svg").is_file());
        assert!(dest.join("b.png").is_file());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "a.svg");
        assert_eq!(records[0].author(), "MyIcons");
        assert_eq!(records[0].storage(), fx.storage);
        assert!(!records[0].icon().contains("class"));
    }

    #[tokio::test]
    async fn test_import_copies_nested_and_vcs_folders() {
        let fx = fixture();
        fs::create_dir_all(fx.source.join("sub/.git")).unwrap();
        fs::write(fx.source.join("sub/c.svg"), ICON).unwrap();
        fs::write(fx.source.join("sub/.git/HEAD"), "ref").unwrap();

        let records = import_directory(&fx.source, &fx.storage, &ImportOptions::default())
            .await
            .unwrap();

        let dest = fx.storage.join("MyIcons");
        assert!(dest.join("sub/.git/HEAD").is_file());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].author(), "sub");
    }

    #[tokio::test]
    async fn test_existing_destination_is_rejected_without_writes() {
        let fx = fixture();
        let dest = fx.storage.join("MyIcons");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("old.svg"), ICON).unwrap();

        let err = import_directory(&fx.source, &fx.storage, &ImportOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DestinationExists);
        let names: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("old.svg")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_imports_of_one_name_claim_once() {
        let fx = fixture();
        let options = ImportOptions::default();

        let (a, b) = tokio::join!(
            import_directory(&fx.source, &fx.storage, &options),
            import_directory(&fx.source, &fx.storage, &options),
        );

        let (ok, err) = match (a, b) {
            (Ok(records), Err(err)) | (Err(err), Ok(records)) => (records, err),
            (a, b) => panic!("expected one winner, got {:?} and {:?}", a.is_ok(), b.is_ok()),
        };
        assert_eq!(ok.len(), 1);
        assert_eq!(err.kind(), ErrorKind::DestinationExists);
        assert!(fx.storage.join("MyIcons/a.svg").is_file());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let fx = fixture();
        let err = import_directory(&fx.source.join("nope"), &fx.storage, &ImportOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
    }

    #[tokio::test]
    async fn test_file_source() {
        let fx = fixture();
        let err = import_directory(&fx.source.join("a.svg"), &fx.storage, &ImportOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_source_containing_storage_is_rejected() {
        let fx = fixture();
        let parent = fx.storage.parent().unwrap().to_path_buf();
        let err = import_directory(&parent, &fx.storage, &ImportOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSource);
    }

    #[tokio::test]
    async fn test_storage_root_is_created() {
        let fx = fixture();
        let storage = fx.storage.join("nested/root");
        let records = import_directory(&fx.source, &storage, &ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(storage.join("MyIcons/a.svg").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_failure_rolls_back() {
        let fx = fixture();
        std::os::unix::fs::symlink(fx.source.join("gone.svg"), fx.source.join("z-dangling.svg")).unwrap();

        let err = import_directory(&fx.source, &fx.storage, &ImportOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CopyFailed);
        assert!(err.to_string().contains("partial copy removed"));
        assert!(!fx.storage.join("MyIcons").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_failure_without_rollback_keeps_partial_copy() {
        let fx = fixture();
        std::os::unix::fs::symlink(fx.source.join("gone.svg"), fx.source.join("z-dangling.svg")).unwrap();

        let options = ImportOptions {
            rollback: false,
            ..ImportOptions::default()
        };
        let err = import_directory(&fx.source, &fx.storage, &options)
            .await
            .unwrap_err();

        assert!(matches!(err, ShelfError::CopyFailed { rolled_back: false, .. }));
        assert!(fx.storage.join("MyIcons").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_skipped() {
        let fx = fixture();
        let elsewhere = fx.storage.parent().unwrap().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        fs::write(elsewhere.join("x.svg"), ICON).unwrap();
        std::os::unix::fs::symlink(&elsewhere, fx.source.join("link")).unwrap();

        let records = import_directory(&fx.source, &fx.storage, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert!(!fx.storage.join("MyIcons/link").exists());
    }

    #[tokio::test]
    async fn test_cancelled_copy_leaves_nothing() {
        let fx = fixture();
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = import_directory_with(&fx.source, &fx.storage, &ImportOptions::default(), &cancel)
            .await
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(!fx.storage.join("MyIcons").exists());
    }
}
