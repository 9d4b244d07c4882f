//! Core shared types for Aries agent controllers.

#![warn(missing_docs, clippy::pedantic)]

mod discriminant;
mod error;
mod ids;
pub mod registry;
mod timestamp;

/// Closed tag sets and the macro that declares them.
pub use discriminant::Discriminant;
/// Error type and result alias shared across the controller crates.
pub use error::{Error, Result};
/// Identifiers minted by the agent.
pub use ids::{
    ConnectionId, CredentialDefinitionId, CredentialExchangeId, Did, PresentationExchangeId,
    RevocationRegistryId, SchemaId, ThreadId,
};
/// Webhook topic discriminant.
pub use registry::Topic;
/// Agent-formatted timestamp.
pub use timestamp::Timestamp;

#[doc(hidden)]
pub use serde as __serde;
