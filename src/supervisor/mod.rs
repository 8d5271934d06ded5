// src/supervisor/mod.rs

//! Retry supervisor for a single executable.
//!
//! The pure state machine lives in [`state`]; the async shell that gates,
//! spawns and waits is implemented in [`run`].

pub mod run;
pub mod state;

pub use run::{RunContext, RunReport, SupervisedRun};
pub use state::{evaluate, RunState};
