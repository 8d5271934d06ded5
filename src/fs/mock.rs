// src/fs/mock.rs

use super::{DirEntryInfo, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEntry {
    File,
    Dir,
}

/// In-memory filesystem for dispatcher and supervisor tests.
///
/// Cloning shares the underlying state, so a test can keep one handle and
/// hand another to the code under test, then add or remove entries while it
/// runs.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file, creating its parent directory implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::File);
    }

    /// Add an (empty) directory, creating its parent directory implicitly.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Dir);
    }

    /// Remove an entry (and anything below it).
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock_entries();
        entries.retain(|p, _| !p.starts_with(path));
    }

    /// Make `read_dir` on `path` fail until [`MockFileSystem::set_readable`].
    pub fn set_unreadable(&self, path: impl AsRef<Path>) {
        self.lock_unreadable().insert(path.as_ref().to_path_buf());
    }

    pub fn set_readable(&self, path: impl AsRef<Path>) {
        self.lock_unreadable().remove(path.as_ref());
    }

    fn insert(&self, path: &Path, kind: MockEntry) {
        let mut entries = self.lock_entries();
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            entries.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
            parent = dir.parent();
        }
        entries.insert(path.to_path_buf(), kind);
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_unreadable(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        self.unreadable
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock_entries().contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>> {
        if self.lock_unreadable().contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }

        let entries = self.lock_entries();
        match entries.get(path) {
            Some(MockEntry::Dir) => Ok(entries
                .iter()
                .filter(|(p, _)| p.parent() == Some(path))
                .map(|(p, kind)| DirEntryInfo {
                    path: p.clone(),
                    is_dir: *kind == MockEntry::Dir,
                })
                .collect()),
            Some(MockEntry::File) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Err(anyhow!("Directory not found: {:?}", path)),
        }
    }
}
