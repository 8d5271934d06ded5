// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`executable`] describes a candidate program and whether it is gated on
//!   the screen being unlocked.
//! - [`process`] runs one child invocation under a timeout and a
//!   cancellation token.
//! - [`capture`] forwards child stdout/stderr to a [`LineSink`] line by line.
//! - [`backend`] provides the `Launcher` trait and the production
//!   `ProcessLauncher`, which tests can replace with a fake.

pub mod backend;
pub mod capture;
pub mod executable;
pub mod process;

pub use backend::{Launcher, ProcessLauncher};
pub use capture::{LineSink, OutputCapture, TracingLineSink};
pub use executable::Executable;
pub use process::run_attempt;
