// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `waked`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "waked",
    version,
    about = "Execute programs whenever the machine resumes from sleep.",
    long_about = "Execute programs whenever the machine resumes from sleep.\n\n\
        Every non-directory entry of DIRECTORY is executed on each resume. \
        Programs that exit non-zero are re-executed until they succeed, are \
        removed from the directory, or the next resume starts a new round.\n\n\
        Programs whose name contains '-on-unlock' only run once the screen \
        is unlocked."
)]
pub struct CliArgs {
    /// Directory containing the programs to execute.
    ///
    /// Default: `/usr/local/etc/waked`.
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WAKED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Treat startup as a resume and execute everything once immediately.
    #[arg(long)]
    pub run_at_start: bool,

    /// How often (seconds) to poll the clocks for a sleep/resume gap.
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    pub clock_poll_secs: u64,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
