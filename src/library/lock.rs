//! Per-storage-root reader/writer locks.
//!
//! Catalog scans hold a read guard and may overlap each other. An import
//! holds the write guard so no scan of the same root observes a
//! half-copied folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::utils::path::normalize_path;

#[derive(Debug, Default)]
pub struct StorageLocks {
    locks: Mutex<FxHashMap<PathBuf, Arc<RwLock<()>>>>,
}

impl StorageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self, root: &Path) -> OwnedRwLockReadGuard<()> {
        self.lock_for(root).read_owned().await
    }

    pub async fn write(&self, root: &Path) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(root).write_owned().await
    }

    /// Same lock for every spelling of the same directory.
    fn lock_for(&self, root: &Path) -> Arc<RwLock<()>> {
        let key = normalize_path(root);
        Arc::clone(self.locks.lock().entry(key).or_default())
    }
}
