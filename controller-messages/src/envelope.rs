//! Wire envelopes for outbound messages.
//!
//! Commands travel as `{ "type": <tag>, "payload": <object> }` and queries as
//! `{ "type": <tag>, "body": <object> }`, with `body` omitted when the query
//! takes no arguments. Building an envelope never fails and never copies or
//! coerces the payload.

use serde::{Deserialize, Serialize};

use crate::command::CommandType;
use crate::query::QueryType;

/// Payload types that belong to exactly one command.
pub trait CommandPayload: Serialize {
    /// Tag of the command carrying this payload.
    const TYPE: CommandType;
}

/// Body types that belong to exactly one query.
pub trait QueryBody: Serialize {
    /// Tag of the query carrying this body.
    const TYPE: QueryType;
}

/// A command envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<P> {
    #[serde(rename = "type")]
    message_type: CommandType,
    payload: P,
}

impl<P> Message<P> {
    /// Wraps `payload` under an explicit tag.
    #[must_use]
    pub const fn new(message_type: CommandType, payload: P) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Tag the message was built with.
    #[must_use]
    pub const fn message_type(&self) -> CommandType {
        self.message_type
    }

    /// Payload the message was built with.
    #[must_use]
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Returns the payload, dropping the tag.
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: CommandPayload> Message<P> {
    /// Wraps a typed payload under the tag it belongs to.
    #[must_use]
    pub const fn of(payload: P) -> Self {
        Self::new(P::TYPE, payload)
    }
}

impl<P: CommandPayload> From<P> for Message<P> {
    fn from(payload: P) -> Self {
        Self::of(payload)
    }
}

/// A query envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request<B> {
    #[serde(rename = "type")]
    query_type: QueryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<B>,
}

impl<B> Request<B> {
    /// A query without arguments.
    #[must_use]
    pub const fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            body: None,
        }
    }

    /// A query with a body.
    #[must_use]
    pub const fn with_body(query_type: QueryType, body: B) -> Self {
        Self {
            query_type,
            body: Some(body),
        }
    }

    /// Tag the request was built with.
    #[must_use]
    pub const fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Body the request was built with.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Returns the body, dropping the tag.
    #[must_use]
    pub fn into_body(self) -> Option<B> {
        self.body
    }
}

impl<B: QueryBody> Request<B> {
    /// Wraps a typed body under the tag it belongs to.
    #[must_use]
    pub const fn of(body: B) -> Self {
        Self::with_body(B::TYPE, body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn message_reads_back_what_it_was_built_with() {
        let payload = json!({
            "schema_id": "WgWxqztrNooG92RXvxSTWv:2:degree:1.0",
            "tag": "default"
        });
        let message = Message::new(CommandType::CreateCredentialDefinition, payload.clone());

        assert_eq!(
            message.message_type(),
            CommandType::CreateCredentialDefinition
        );
        assert_eq!(message.payload(), &payload);
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"type": "CREATE_CREDENTIAL_DEFINITION", "payload": payload})
        );
    }

    #[test]
    fn request_omits_absent_body() {
        let status: Request<Value> = Request::new(QueryType::GetStatus);
        assert_eq!(status.body(), None);
        assert_eq!(
            serde_json::to_value(&status).expect("serialize"),
            json!({"type": "GET_STATUS"})
        );

        let one = Request::with_body(QueryType::GetConnection, json!({"connection_id": "abc"}));
        assert_eq!(one.query_type(), QueryType::GetConnection);
        assert_eq!(one.body(), Some(&json!({"connection_id": "abc"})));
    }

    #[test]
    fn unknown_tags_do_not_deserialize() {
        let err = serde_json::from_value::<Message<Value>>(json!({
            "type": "UNKNOWN_TAG",
            "payload": {}
        }));
        assert!(err.is_err());
    }
}
