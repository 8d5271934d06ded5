// src/lock/mod.rs

//! Lock-state oracle: "is the interactive session currently locked?"
//!
//! The oracle has no state of its own and performs no retries. Every gated
//! attempt asks again. A failure is reported as an error and callers map it
//! to [`LockState::Unknown`](crate::types::LockState), which the supervisor
//! treats as unlocked.

pub mod oracle;

pub use oracle::{query_lock_state, CommandLockOracle, HelperCommand, LockOracle};
