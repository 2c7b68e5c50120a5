//! Catalog building.
//!
//! Scatter/gather over a [`JoinSet`]: one task per enumerated file
//! (stat + read + normalize), bounded by a semaphore. The report is only
//! returned once every task has settled.
//!
//! A file that fails on its own (vanished, unreadable, malformed) is
//! logged and reported in [`CatalogReport::skipped`]; the rest of the
//! build goes on. Enumeration failures abort the build.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::error::{Outcome, Result, ShelfError};
use super::normalize::{NormalizeOptions, normalize_with};
use super::record::{CatalogReport, IconRecord, SkippedFile};
use super::scan::{ScanOptions, enumerate};
use crate::core::CancelToken;
use crate::{debug, log};

/// Default number of files processed at once.
pub const DEFAULT_CONCURRENCY: usize = 32;

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub scan: ScanOptions,
    pub normalize: NormalizeOptions,
    /// Upper bound on files being read/normalized at the same time.
    pub concurrency: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            normalize: NormalizeOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Catalog every matching file below `root`.
///
/// Every record's `storage` is `root`.
pub async fn build_catalog(root: &Path, options: &CatalogOptions) -> Result<Vec<IconRecord>> {
    let outcome = build_catalog_in(root, root, options, &CancelToken::new()).await?;
    Ok(outcome.done().map(|report| report.icons).unwrap_or_default())
}

/// Catalog the files below `scan_root`, labelling records with `storage`.
///
/// Returns [`Outcome::Cancelled`] if `cancel` trips before all files
/// are processed; outstanding tasks are aborted.
pub async fn build_catalog_in(
    storage: &Path,
    scan_root: &Path,
    options: &CatalogOptions,
    cancel: &CancelToken,
) -> Result<Outcome<CatalogReport>> {
    let Some(files) = collect_files(scan_root, &options.scan, cancel).await? else {
        return Ok(Outcome::Cancelled);
    };
    debug!("catalog"; "{} candidate file(s) under {}", files.len(), scan_root.display());

    let storage: Arc<Path> = Arc::from(storage);
    let normalize = Arc::new(options.normalize.clone());
    let permits = Arc::new(Semaphore::new(options.concurrency.clamp(1, Semaphore::MAX_PERMITS)));

    let mut tasks = JoinSet::new();
    for path in files {
        let storage = Arc::clone(&storage);
        let normalize = Arc::clone(&normalize);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // The semaphore is never closed, so acquisition only fails if it were.
            let _permit = permits.acquire_owned().await.ok();
            let result = catalog_file(&storage, &path, normalize).await;
            (path, result)
        });
    }

    let mut report = CatalogReport::default();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tasks.abort_all();
                return Ok(Outcome::Cancelled);
            }
            joined = tasks.join_next() => match joined {
                None => break,
                Some(Ok((_, Ok(record)))) => report.icons.push(record),
                Some(Ok((path, Err(err)))) => {
                    log!("catalog"; "skipping {}: {}", path.display(), err);
                    report.skipped.push(SkippedFile {
                        path,
                        kind: err.kind(),
                        message: crate::library::error::error_chain(&err),
                    });
                }
                Some(Err(err)) => return Err(join_failure(scan_root, err)),
            },
        }
    }

    report.icons.sort_by(|a, b| a.path().cmp(b.path()));
    report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("catalog"; "{} icon(s), {} skipped", report.icons.len(), report.skipped.len());

    Ok(Outcome::Done(report))
}

/// Walk `root` on a blocking thread. `None` means cancelled.
async fn collect_files(
    root: &Path,
    scan: &ScanOptions,
    cancel: &CancelToken,
) -> Result<Option<Vec<PathBuf>>> {
    let owned_root = root.to_path_buf();
    let scan = scan.clone();
    let cancel = cancel.clone();

    tokio::task::spawn_blocking(move || -> Result<Option<Vec<PathBuf>>> {
        let mut files = Vec::new();
        for file in enumerate(&owned_root, &scan)? {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            files.push(file?);
        }
        Ok(Some(files))
    })
    .await
    .map_err(|err| join_failure(root, err))?
}

/// Stat, read and normalize one file.
async fn catalog_file(
    storage: &Path,
    path: &Path,
    normalize: Arc<NormalizeOptions>,
) -> Result<IconRecord> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| ShelfError::io(path, e))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ShelfError::io(path, e))?;
    let size = bytes.len() as u64;
    let text = String::from_utf8(bytes).map_err(|e| ShelfError::malformed(path, e))?;

    // Birth time is not reported everywhere (e.g. some Linux filesystems).
    let date = meta
        .created()
        .or_else(|_| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let owned_path = path.to_path_buf();
    let icon = tokio::task::spawn_blocking(move || normalize_with(&text, &owned_path, &normalize))
        .await
        .map_err(|err| join_failure(path, err))??;

    Ok(IconRecord::new(storage, path.to_path_buf(), size, date, icon))
}

fn join_failure(path: &Path, err: JoinError) -> ShelfError {
    ShelfError::Io(path.to_path_buf(), std::io::Error::other(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    const ICON: &str = r#"<svg width="24" height="24" class="i"><path class="p" d="M0 0"/></svg>"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_logo_scenario() {
        let dir = TempDir::new().unwrap();
        let body = r#"<svg viewBox="0 0 1 1"></svg>"#;
        let padded = format!("{body}{}", " ".repeat(120 - body.len()));
        write(dir.path(), "Alice/logo.svg", &padded);
        write(dir.path(), "Alice/.git/cache.svg", ICON);

        let records = build_catalog(dir.path(), &CatalogOptions::default()).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "logo.svg");
        assert_eq!(records[0].author(), "Alice");
        assert_eq!(records[0].size(), 120);
        assert_eq!(records[0].storage(), dir.path());
    }

    #[tokio::test]
    async fn test_only_matching_files_are_cataloged() {
        let dir = TempDir::new().unwrap();
        for i in 0..25 {
            write(dir.path(), &format!("Pack{}/icon{i}.svg", i % 3), ICON);
            write(dir.path(), &format!("Pack{}/icon{i}.png", i % 3), "png");
        }
        write(dir.path(), "Pack0/readme.md", "# icons");

        let options = CatalogOptions {
            concurrency: 4,
            ..CatalogOptions::default()
        };
        let records = build_catalog(dir.path(), &options).await.unwrap();

        assert_eq!(records.len(), 25);
        for record in &records {
            assert!(record.name().ends_with(".svg"));
            assert_eq!(
                record.author(),
                record.path().parent().unwrap().file_name().unwrap().to_str().unwrap()
            );
            assert!(!record.icon().contains("class="));
            assert!(!record.icon().contains(r#"width="24""#));
        }
        let mut paths: Vec<_> = records.iter().map(|r| r.path().to_path_buf()).collect();
        let sorted = {
            let mut p = paths.clone();
            p.sort();
            p
        };
        assert_eq!(paths, sorted);
        paths.dedup();
        assert_eq!(paths.len(), 25);
    }

    #[tokio::test]
    async fn test_malformed_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A/good.svg", ICON);
        write(dir.path(), "A/broken.svg", "<svg><g></svg>");

        let outcome = build_catalog_in(dir.path(), dir.path(), &CatalogOptions::default(), &CancelToken::new())
            .await
            .unwrap();
        let report = outcome.done().unwrap();

        assert_eq!(report.icons.len(), 1);
        assert_eq!(report.icons[0].name(), "good.svg");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].kind, ErrorKind::MalformedSvg);
        assert!(report.skipped[0].path.ends_with("A/broken.svg"));
    }

    #[tokio::test]
    async fn test_non_utf8_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A/latin1.svg");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, [0x3c, 0x73, 0x76, 0x67, 0xe9, 0x2f, 0x3e]).unwrap();

        let outcome = build_catalog_in(dir.path(), dir.path(), &CatalogOptions::default(), &CancelToken::new())
            .await
            .unwrap();
        let report = outcome.done().unwrap();
        assert!(report.icons.is_empty());
        assert_eq!(report.skipped[0].kind, ErrorKind::MalformedSvg);
    }

    #[tokio::test]
    async fn test_scoped_build_keeps_storage_label() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Old/a.svg", ICON);
        write(dir.path(), "New/b.svg", ICON);

        let outcome = build_catalog_in(
            dir.path(),
            &dir.path().join("New"),
            &CatalogOptions::default(),
            &CancelToken::new(),
        )
        .await
        .unwrap();
        let report = outcome.done().unwrap();

        assert_eq!(report.icons.len(), 1);
        assert_eq!(report.icons[0].name(), "b.svg");
        assert_eq!(report.icons[0].storage(), dir.path());
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = build_catalog(&dir.path().join("missing"), &CatalogOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let dir = TempDir::new().unwrap();
        let records = build_catalog(dir.path(), &CatalogOptions::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_build() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A/a.svg", ICON);

        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = build_catalog_in(dir.path(), dir.path(), &CatalogOptions::default(), &cancel)
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_rescan_produces_fresh_snapshot() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A/a.svg", ICON);
        let first = build_catalog(dir.path(), &CatalogOptions::default()).await.unwrap();

        write(dir.path(), "A/b.svg", ICON);
        let second = build_catalog(dir.path(), &CatalogOptions::default()).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0], second[0]);
    }
}
