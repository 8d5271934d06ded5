// src/dispatch/mod.rs

//! Wake dispatcher: turns resume events into generations of supervised runs.
//!
//! Exactly one [`Generation`] is active at a time. A resume event lists the
//! executables directory, cancels the active generation, and starts a new
//! one under the process-wide shutdown token.

pub mod dispatcher;
pub mod generation;

pub use dispatcher::{WakeDispatcher, WakeReport};
pub use generation::Generation;
