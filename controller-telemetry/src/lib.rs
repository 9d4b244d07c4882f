//! Tracing setup for Aries controllers.
//!
//! The controller crates only emit `tracing` events; binaries call
//! [`init_tracing`] once to install a `fmt` subscriber.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Environment variable consulted by [`init_tracing_from_env`].
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        /// The rejected directive.
        filter: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },
    /// A global subscriber was already set.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Parses a filter directive such as `info,controller_events=debug`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the directive is malformed.
pub fn parse_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|source| TelemetryError::Filter {
        filter: filter.to_owned(),
        source,
    })
}

/// Installs a global `fmt` subscriber filtered by `filter`.
///
/// # Errors
///
/// Fails when the filter is malformed or a subscriber is already installed.
pub fn init_tracing(filter: &str) -> TelemetryResult<()> {
    let directive = parse_filter(filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(directive)
        .with_target(false)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))?;
    debug!(filter, "tracing subscriber installed");
    Ok(())
}

/// Installs the subscriber using `RUST_LOG` when set, else `fallback`.
///
/// Pass the configured controller log filter as `fallback`.
///
/// # Errors
///
/// See [`init_tracing`].
pub fn init_tracing_from_env(fallback: &str) -> TelemetryResult<()> {
    let filter = std::env::var(RUST_LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_owned());
    init_tracing(&filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("warn,controller_events=debug").is_ok());
    }

    #[test]
    fn rejects_malformed_filter() {
        let err = parse_filter("controller_events=loudest").expect_err("bad level");
        assert!(matches!(
            err,
            TelemetryError::Filter { ref filter, .. } if filter.contains("loudest")
        ));
        assert!(init_tracing("controller_events=loudest").is_err());
    }

    #[test]
    fn second_install_is_reported() {
        let first = init_tracing("debug");
        let second = init_tracing("info");
        match first {
            Ok(()) => assert!(tracing::enabled!(tracing::Level::DEBUG)),
            Err(err) => assert!(matches!(err, TelemetryError::AlreadyInstalled(_))),
        }
        assert!(matches!(second, Err(TelemetryError::AlreadyInstalled(_))));
    }
}
