// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `filenotify`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "filenotify",
    version,
    about = "Watch paths for changes and log every detected event.",
    long_about = None
)]
pub struct CliArgs {
    /// Paths to watch. Directories are expanded recursively.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Which backend to use.
    ///
    /// `auto` probes the kernel release and falls back to polling in
    /// environments where native events are unreliable (Docker Desktop, WSL).
    #[arg(long, value_enum, default_value = "auto")]
    pub backend: BackendArg,

    /// Poll interval in milliseconds for the polling backend.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub interval_ms: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FILENOTIFY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Backend selection as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    Events,
    Poll,
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
