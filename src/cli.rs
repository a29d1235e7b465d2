// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `treesync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "treesync",
    version,
    about = "Mirror a local directory tree onto a remote HTTP store.",
    long_about = None
)]
pub struct CliArgs {
    /// Root directory to watch. Remote keys are computed relative to it.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Path to a config file (TOML).
    ///
    /// If omitted, `Treesync.toml` in the current working directory is used
    /// when present; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remote base URL. Overrides `[remote].endpoint` from the config file.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Watch only the root directory itself, not its subdirectories.
    #[arg(long)]
    pub no_recursive: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TREESYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective settings and the directories that would be
    /// watched, then exit without syncing anything.
    #[arg(long)]
    pub dry_run: bool,
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
