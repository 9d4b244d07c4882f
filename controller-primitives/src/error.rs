//! Shared error definitions for controller primitives.

use thiserror::Error;

/// Result alias used throughout the controller crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive wire types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Identifier failed validation.
    #[error("invalid {kind} `{id}`: {reason}")]
    InvalidId {
        /// Name of the identifier type.
        kind: &'static str,
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: &'static str,
    },

    /// A tag string did not belong to the closed set of a discriminant.
    #[error("unknown {kind} tag `{tag}`")]
    UnknownTag {
        /// Name of the discriminant type.
        kind: &'static str,
        /// The unrecognized tag.
        tag: String,
    },

    /// Timestamp text emitted by the agent could not be parsed.
    #[error("invalid timestamp `{value}`")]
    InvalidTimestamp {
        /// The raw timestamp string.
        value: String,
    },
}
