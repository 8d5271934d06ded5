// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{RawSupervisorConfig, SupervisorConfig};
use crate::errors::{Result, WakedError};

impl TryFrom<RawSupervisorConfig> for SupervisorConfig {
    type Error = crate::errors::WakedError;

    fn try_from(raw: RawSupervisorConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(SupervisorConfig::new_unchecked(
            clean_path(&raw.exes_dir),
            raw.unlock_marker,
            raw.timings,
        ))
    }
}

fn validate_raw_config(cfg: &RawSupervisorConfig) -> Result<()> {
    validate_exes_dir(&cfg.exes_dir)?;
    validate_marker(&cfg.unlock_marker)?;
    Ok(())
}

fn validate_exes_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(WakedError::ConfigError(
            "please specify a directory containing executables to execute".to_string(),
        ));
    }

    // A missing directory is tolerated: every wake event re-lists it and
    // logs the failure. A regular file in its place can never work.
    if dir.exists() && !dir.is_dir() {
        return Err(WakedError::ConfigError(format!(
            "executables path {:?} exists but is not a directory",
            dir
        )));
    }

    Ok(())
}

fn validate_marker(marker: &str) -> Result<()> {
    if marker.is_empty() {
        return Err(WakedError::ConfigError(
            "unlock marker must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Lexically normalise a path: drop `.` components and fold `..` into the
/// preceding normal component. Does not touch the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
