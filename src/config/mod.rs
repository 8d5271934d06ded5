// src/config/mod.rs

//! Configuration for waked.
//!
//! Responsibilities:
//! - Define the supervisor settings and retry timings (`model.rs`).
//! - Build settings from the command line (`loader.rs`).
//! - Validate startup invariants (`validate.rs`). These are the only
//!   errors that are fatal for the whole process.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_from_args, default_exes_dir};
pub use model::{
    RawSupervisorConfig, SupervisorConfig, Timings, DEFAULT_EXES_DIR, DEFAULT_UNLOCK_MARKER,
};
pub use validate::clean_path;
