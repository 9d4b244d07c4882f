//! Outbound messages for an Aries cloud agent.
//!
//! Commands ([`Command`]) change agent state and travel as
//! `{ type, payload }`; queries ([`Query`]) read it and travel as
//! `{ type, body? }`. Both tag sets come from the shared
//! [`controller_primitives::registry::message_type`] registry, and both
//! families classify inbound envelopes the same way webhook records do.

#![warn(missing_docs, clippy::pedantic)]

pub mod command;
mod envelope;
pub mod query;
pub mod results;

pub use command::{Command, CommandType};
pub use envelope::{CommandPayload, Message, QueryBody, Request};
pub use query::{Query, QueryType};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use controller_primitives::Discriminant;
    use controller_primitives::registry::message_type;

    use super::*;

    #[test]
    fn command_and_query_tags_partition_the_registry() {
        let commands: HashSet<_> = CommandType::TAGS.iter().copied().collect();
        let queries: HashSet<_> = QueryType::TAGS.iter().copied().collect();

        assert!(commands.is_disjoint(&queries));
        assert_eq!(commands.len(), CommandType::ALL.len());
        assert_eq!(queries.len(), QueryType::ALL.len());

        let registry: HashSet<_> = message_type::ALL.iter().copied().collect();
        let declared: HashSet<_> = commands.union(&queries).copied().collect();
        assert_eq!(declared, registry);
    }

    #[test]
    fn tags_follow_registry_order() {
        let (commands, queries) = message_type::ALL.split_at(CommandType::ALL.len());
        assert_eq!(CommandType::TAGS, commands);
        assert_eq!(QueryType::TAGS, queries);
        assert_eq!(CommandType::ALL.last(), Some(&CommandType::RemoveConnection));
        assert_eq!(CommandType::RemoveConnection.ordinal(), 15);
    }
}
