// src/exec/executable.rs

use std::fmt;
use std::path::{Path, PathBuf};

/// An executable found in the watched directory.
///
/// `requires_unlock` is derived once from the base name and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Executable {
    path: PathBuf,
    requires_unlock: bool,
}

impl Executable {
    /// Describe `path`, flagging it as lock-gated when its base name
    /// contains `unlock_marker`.
    pub fn new(path: impl Into<PathBuf>, unlock_marker: &str) -> Self {
        let path = path.into();
        let requires_unlock = !unlock_marker.is_empty()
            && path
                .file_name()
                .map(|name| name.to_string_lossy().contains(unlock_marker))
                .unwrap_or(false);

        Self {
            path,
            requires_unlock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn requires_unlock(&self) -> bool {
        self.requires_unlock
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
