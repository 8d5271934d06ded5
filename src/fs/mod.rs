// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// Full path of the entry (directory joined with the entry name).
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Abstract filesystem interface.
///
/// The dispatcher lists the executables directory through this trait and
/// supervised runs use it to stat their executable before each attempt.
pub trait FileSystem: Send + Sync + Debug {
    /// Whether `path` can currently be stat'ed.
    fn exists(&self, path: &Path) -> bool;

    /// Return the entries of a directory, non-recursively, sorted by path.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry.with_context(|| format!("reading entry of {:?}", path))?;
            // `file_type` does not follow symlinks, so a link to a
            // directory is treated like any other candidate.
            let file_type = entry
                .file_type()
                .with_context(|| format!("reading file type of {:?}", entry.path()))?;
            entries.push(DirEntryInfo {
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
