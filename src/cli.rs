// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build, lint and live-serve front-end assets as a task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: clean, css, js, images, build, watch or default.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// When the default file is missing, built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Assetdag.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the task graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// List the exported tasks and their composition.
    #[arg(long)]
    pub list: bool,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_to_default() {
        let args = CliArgs::try_parse_from(["assetdag"]).unwrap();
        assert_eq!(args.task, "default");
        assert_eq!(args.config, "Assetdag.toml");
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_task_and_flags() {
        let args = CliArgs::try_parse_from([
            "assetdag",
            "build",
            "--config",
            "site/Assetdag.toml",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.task, "build");
        assert_eq!(args.config, "site/Assetdag.toml");
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }
}
