// src/logging.rs

//! `tracing` subscriber setup.
//!
//! `--log-level` sets one level for everything. Without it, `ASSETDAG_LOG`
//! is read as an `EnvFilter` directive list (`debug`,
//! `assetdag=debug,tower_http=warn`, ...). Anything else means `info`.
//!
//! Logs go to stderr; lint reports and listings are printed on stdout.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "ASSETDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = resolve_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

fn resolve_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.directive());
    }
    env_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    fn max(filter: EnvFilter) -> Option<LevelFilter> {
        filter.max_level_hint()
    }

    #[test]
    fn cli_flag_wins_over_env() {
        let filter = resolve_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(max(filter), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_directives_are_used_without_flag() {
        assert_eq!(max(resolve_filter(None, Some(" warn "))), Some(LevelFilter::WARN));
        let per_module = resolve_filter(None, Some("assetdag=trace,tower_http=warn"));
        assert_eq!(max(per_module), Some(LevelFilter::TRACE));
    }

    #[test]
    fn garbage_env_falls_back_to_info() {
        assert_eq!(max(resolve_filter(None, Some("assetdag=loud"))), Some(LevelFilter::INFO));
        assert_eq!(max(resolve_filter(None, Some(""))), Some(LevelFilter::INFO));
        assert_eq!(max(resolve_filter(None, None)), Some(LevelFilter::INFO));
    }
}
