// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `verirun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "verirun",
    version,
    about = "Run verification tasks in dependency order with bounded parallelism.",
    long_about = None
)]
pub struct CliArgs {
    /// Name of the task to run (its dependencies are included automatically).
    ///
    /// Mutually exclusive with `--all`; exactly one of the two is required.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Run every declared task.
    #[arg(long, conflicts_with = "task")]
    pub all: bool,

    /// Maximum number of tasks running at once.
    ///
    /// Default: available parallelism of the machine.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Per-task timeout in seconds. 0 disables the timeout.
    ///
    /// Overrides `timeout_secs` from the `[config]` section.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Stop launching new tasks after the first failure or timeout.
    #[arg(long)]
    pub fail_fast: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Verirun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Verirun.toml")]
    pub config: String,

    /// Where to write the JSON session summary.
    ///
    /// Overrides `summary_path` from the `[config]` section.
    #[arg(long, value_name = "PATH")]
    pub summary_out: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VERIRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved execution order, but run nothing.
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
