//! Recursive SVG file enumeration.
//!
//! ```text
//! Icons/
//! ├── Alice/
//! │   ├── logo.svg        -> yielded
//! │   ├── logo.png        -> (extension, skipped)
//! │   └── .git/           -> (pruned, never read)
//! └── Bob/
//!     └── arrows/
//!         └── UP.SVG      -> yielded (extension match is case-insensitive)
//! ```

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{DirEntryIter, WalkDir};

use super::error::{Result, ShelfError};

/// Filters applied while walking the storage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Accepted file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Directory names that are never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["svg".to_string()],
            skip_dirs: vec![".git".to_string()],
        }
    }
}

/// Lazy iterator over matching files below a root.
///
/// Directory listings are sorted by file name, so the yield order is stable.
pub struct SvgFiles {
    inner: DirEntryIter<((), ())>,
    extensions: Arc<[String]>,
}

impl Iterator for SvgFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(walk_error(err))),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() || !matches_extension(&entry.file_name, &self.extensions) {
                continue;
            }

            let path = entry.path();
            // Symlinks count when they resolve to a regular file.
            if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                return Some(Ok(path));
            }
        }
    }
}

/// Start enumerating matching files below `root`.
///
/// Fails up front with [`ShelfError::PathNotFound`] or
/// [`ShelfError::NotADirectory`]; errors met during the walk are yielded.
pub fn enumerate(root: &Path, options: &ScanOptions) -> Result<SvgFiles> {
    let meta = fs::metadata(root).map_err(|e| ShelfError::io(root, e))?;
    if !meta.is_dir() {
        return Err(ShelfError::NotADirectory(root.to_path_buf()));
    }

    let skip_dirs: Arc<[String]> = options.skip_dirs.clone().into();
    let inner = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .process_read_dir(move |_depth, _dir, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => {
                    !(entry.file_type().is_dir()
                        && skip_dirs.iter().any(|name| entry.file_name.as_os_str() == OsStr::new(name)))
                }
                Err(_) => true,
            });
        })
        .into_iter();

    Ok(SvgFiles {
        inner,
        extensions: options.extensions.clone().into(),
    })
}

/// Enumerate and collect, failing on the first walk error.
pub fn collect_svg_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    enumerate(root, options)?.collect()
}

/// Exact, case-insensitive extension match (`a.svg`, `A.SVG`; not `a.svg.bak`).
pub fn matches_extension(file_name: &OsStr, extensions: &[String]) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn walk_error(err: jwalk::Error) -> ShelfError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.into_io_error() {
        Some(io) => ShelfError::io(path, io),
        None => ShelfError::Io(path, std::io::Error::other("directory walk failed")),
    }
}
