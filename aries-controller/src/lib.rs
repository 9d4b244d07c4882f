//! Typed controller toolkit for Aries cloud agents.
//!
//! Bundles the controller crates behind feature flags so downstream users can
//! pull in only the parts they need: webhook events, outbound messages,
//! configuration and tracing setup.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use controller_primitives as primitives;

/// Webhook record families and dispatch (enabled by `events` feature).
#[cfg(feature = "events")]
pub use controller_events as events;

/// Commands, queries and result shapes (enabled by `messages` feature).
#[cfg(feature = "messages")]
pub use controller_messages as messages;

/// Controller configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use controller_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use controller_telemetry as telemetry;

#[cfg(feature = "router")]
mod router;

#[cfg(feature = "router")]
pub use router::{RouteError, RouteResult, Routed, WebhookRouter};

/// Installs tracing with the configured log filter, unless `RUST_LOG` is set.
///
/// # Errors
///
/// Fails when the filter is malformed or a subscriber is already installed.
#[cfg(all(feature = "config", feature = "telemetry"))]
pub fn init_tracing(config: &config::ControllerConfig) -> telemetry::TelemetryResult<()> {
    telemetry::init_tracing_from_env(config.log_filter())
}
