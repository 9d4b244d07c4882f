//! Configuration for Aries controllers.
//!
//! A [`ControllerConfig`] can be built in code, deserialized with serde, or
//! read from `CONTROLLER_*` environment variables. Every source goes through
//! the same validation.

#![warn(missing_docs, clippy::pedantic)]

use std::env;

use controller_events::UnrecognizedPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the webhook path prefix.
pub const WEBHOOK_PREFIX_ENV: &str = "CONTROLLER_WEBHOOK_PREFIX";
/// Environment variable holding the unrecognized-event policy.
pub const UNRECOGNIZED_ENV: &str = "CONTROLLER_UNRECOGNIZED";
/// Environment variable enabling the state tracker.
pub const TRACK_STATE_ENV: &str = "CONTROLLER_TRACK_STATE";
/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CONTROLLER_LOG";

const DEFAULT_WEBHOOK_PREFIX: &str = "/webhooks";
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while building a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting holds a value that cannot be used.
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
            reason,
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of a webhook-driven controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    webhook_prefix: String,
    unrecognized: UnrecognizedPolicy,
    track_state: bool,
    log_filter: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            webhook_prefix: DEFAULT_WEBHOOK_PREFIX.to_owned(),
            unrecognized: UnrecognizedPolicy::default(),
            track_state: false,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl ControllerConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unusable value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unusable value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup(WEBHOOK_PREFIX_ENV) {
            config = config.with_webhook_prefix(prefix)?;
        }
        if let Some(policy) = lookup(UNRECOGNIZED_ENV) {
            let parsed = policy.trim().parse::<UnrecognizedPolicy>().map_err(|_| {
                ConfigError::invalid(UNRECOGNIZED_ENV, policy, "expected `ignore` or `reject`")
            })?;
            config = config.with_unrecognized(parsed);
        }
        if let Some(flag) = lookup(TRACK_STATE_ENV) {
            config = config.with_state_tracking(parse_flag(TRACK_STATE_ENV, &flag)?);
        }
        if let Some(filter) = lookup(LOG_ENV) {
            config = config.with_log_filter(filter)?;
        }

        debug!(
            webhook_prefix = %config.webhook_prefix,
            unrecognized = %config.unrecognized,
            track_state = config.track_state,
            "controller configuration loaded"
        );
        Ok(config)
    }

    /// Sets the path prefix under which the agent posts webhooks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless the prefix starts with `/`
    /// and contains no whitespace.
    pub fn with_webhook_prefix(mut self, prefix: impl Into<String>) -> ConfigResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        self.webhook_prefix = prefix;
        Ok(self)
    }

    /// Sets what dispatch does with unknown topics and states.
    #[must_use]
    pub fn with_unrecognized(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized = policy;
        self
    }

    /// Enables or disables record state tracking.
    #[must_use]
    pub fn with_state_tracking(mut self, enabled: bool) -> Self {
        self.track_state = enabled;
        self
    }

    /// Sets the log filter directive, e.g. `info,controller_events=debug`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the directive is blank.
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> ConfigResult<Self> {
        let filter = filter.into();
        if filter.trim().is_empty() {
            return Err(ConfigError::invalid(LOG_ENV, filter, "filter cannot be empty"));
        }
        self.log_filter = filter;
        Ok(self)
    }

    /// Checks a configuration obtained through deserialization.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_prefix(&self.webhook_prefix)?;
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid(
                LOG_ENV,
                self.log_filter.clone(),
                "filter cannot be empty",
            ));
        }
        Ok(())
    }

    /// Path prefix under which the agent posts webhooks.
    #[must_use]
    pub fn webhook_prefix(&self) -> &str {
        &self.webhook_prefix
    }

    /// Policy for unknown topics and states.
    #[must_use]
    pub const fn unrecognized(&self) -> UnrecognizedPolicy {
        self.unrecognized
    }

    /// Whether record states are tracked.
    #[must_use]
    pub const fn track_state(&self) -> bool {
        self.track_state
    }

    /// Log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

fn validate_prefix(prefix: &str) -> ConfigResult<()> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::invalid(
            WEBHOOK_PREFIX_ENV,
            prefix,
            "prefix must start with `/`",
        ));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            WEBHOOK_PREFIX_ENV,
            prefix,
            "prefix cannot contain whitespace",
        ));
    }
    Ok(())
}

fn parse_flag(key: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ControllerConfig::new();
        assert_eq!(config.webhook_prefix(), "/webhooks");
        assert_eq!(config.unrecognized(), UnrecognizedPolicy::Ignore);
        assert!(!config.track_state());
        assert_eq!(config.log_filter(), "info");
        assert_eq!(ControllerConfig::from_lookup(|_| None), Ok(config));
    }

    #[test]
    fn reads_overrides() {
        let config = ControllerConfig::from_lookup(lookup(&[
            (WEBHOOK_PREFIX_ENV, "/agent/hooks"),
            (UNRECOGNIZED_ENV, "reject"),
            (TRACK_STATE_ENV, "TRUE"),
            (LOG_ENV, "debug"),
        ]))
        .expect("config");

        assert_eq!(config.webhook_prefix(), "/agent/hooks");
        assert_eq!(config.unrecognized(), UnrecognizedPolicy::Reject);
        assert!(config.track_state());
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn rejects_bad_values() {
        let err = ControllerConfig::from_lookup(lookup(&[(UNRECOGNIZED_ENV, "drop")]))
            .expect_err("policy");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: UNRECOGNIZED_ENV,
                ..
            }
        ));

        assert!(ControllerConfig::new().with_webhook_prefix("webhooks").is_err());
        assert!(ControllerConfig::from_lookup(lookup(&[(TRACK_STATE_ENV, "maybe")])).is_err());
        assert!(ControllerConfig::new().with_log_filter("  ").is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"unrecognized": "reject"}"#).expect("config");
        assert_eq!(config.unrecognized(), UnrecognizedPolicy::Reject);
        assert_eq!(config.webhook_prefix(), "/webhooks");
        assert!(config.validate().is_ok());

        let bad: ControllerConfig =
            serde_json::from_str(r#"{"webhook_prefix": "hooks"}"#).expect("config");
        assert!(bad.validate().is_err());
        assert!(serde_json::from_str::<ControllerConfig>(r#"{"port": 8020}"#).is_err());
    }
}
