// src/config/loader.rs

use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::config::model::{RawSupervisorConfig, SupervisorConfig, DEFAULT_EXES_DIR};
use crate::errors::Result;

/// Build and validate the supervisor configuration from parsed CLI args.
///
/// The directory argument falls back to [`default_exes_dir`]; everything
/// else uses the built-in defaults.
pub fn config_from_args(args: &CliArgs) -> Result<SupervisorConfig> {
    let exes_dir = args
        .directory
        .clone()
        .unwrap_or_else(default_exes_dir);

    let raw = RawSupervisorConfig {
        exes_dir,
        ..RawSupervisorConfig::default()
    };

    SupervisorConfig::try_from(raw)
}

/// Well-known directory used when none is given.
pub fn default_exes_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXES_DIR)
}
