//! Read-only queries the controller sends to the agent.

use controller_events::{ConnectionState, RecordFamily, TYPE, optional_field, variant_field};
use controller_primitives::registry::message_type;
use controller_primitives::{
    ConnectionId, CredentialDefinitionId, Discriminant, SchemaId, discriminant,
};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::envelope::{QueryBody, Request};

const BODY: &str = "body";

discriminant! {
    /// Tag of a query envelope.
    pub enum QueryType {
        /// See [`message_type::GET_STATUS`].
        GetStatus => message_type::GET_STATUS,
        /// See [`message_type::GET_CONNECTIONS`].
        GetConnections => message_type::GET_CONNECTIONS,
        /// See [`message_type::GET_CONNECTION`].
        GetConnection => message_type::GET_CONNECTION,
        /// See [`message_type::GET_SCHEMA`].
        GetSchema => message_type::GET_SCHEMA,
        /// See [`message_type::GET_CREDENTIAL_DEFINITION`].
        GetCredentialDefinition => message_type::GET_CREDENTIAL_DEFINITION,
        /// See [`message_type::GET_CREDENTIALS`].
        GetCredentials => message_type::GET_CREDENTIALS,
        /// See [`message_type::GET_CREDENTIAL_EXCHANGE_RECORDS`].
        GetCredentialExchangeRecords => message_type::GET_CREDENTIAL_EXCHANGE_RECORDS,
        /// See [`message_type::GET_PRESENTATION_EXCHANGE_RECORDS`].
        GetPresentationExchangeRecords => message_type::GET_PRESENTATION_EXCHANGE_RECORDS,
    }
}

/// Filter for connection listings. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionFilter {
    /// Connection alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Connection state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ConnectionState>,
    /// Our DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_did: Option<String>,
    /// The peer's DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_did: Option<String>,
    /// The peer's role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_role: Option<String>,
    /// Invitation key the connection was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_key: Option<String>,
}

/// A single connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRef {
    /// Connection identifier.
    pub connection_id: ConnectionId,
}

/// A schema on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    /// Schema identifier.
    pub schema_id: SchemaId,
}

/// A credential definition on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionRef {
    /// Definition identifier.
    pub cred_def_id: CredentialDefinitionId,
}

/// Page and WQL filter over wallet credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredentialFilter {
    /// Index of the first credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Wallet query language filter, serialized as JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wql: Option<String>,
}

/// Filter for exchange record listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeFilter {
    /// Connection of the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Protocol thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Our role in the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Exchange state tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl QueryBody for ConnectionRef {
    const TYPE: QueryType = QueryType::GetConnection;
}

impl QueryBody for SchemaRef {
    const TYPE: QueryType = QueryType::GetSchema;
}

impl QueryBody for CredentialDefinitionRef {
    const TYPE: QueryType = QueryType::GetCredentialDefinition;
}

/// A query narrowed by its `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `GET_STATUS`
    GetStatus,
    /// `GET_CONNECTIONS`
    GetConnections(Option<ConnectionFilter>),
    /// `GET_CONNECTION`
    GetConnection(ConnectionRef),
    /// `GET_SCHEMA`
    GetSchema(SchemaRef),
    /// `GET_CREDENTIAL_DEFINITION`
    GetCredentialDefinition(CredentialDefinitionRef),
    /// `GET_CREDENTIALS`
    GetCredentials(Option<WalletCredentialFilter>),
    /// `GET_CREDENTIAL_EXCHANGE_RECORDS`
    GetCredentialExchangeRecords(Option<ExchangeFilter>),
    /// `GET_PRESENTATION_EXCHANGE_RECORDS`
    GetPresentationExchangeRecords(Option<ExchangeFilter>),
}

impl Query {
    /// Tag of the query.
    #[must_use]
    pub fn query_type(&self) -> QueryType {
        self.tag()
    }

    /// Erases the body type, keeping the wire shape.
    ///
    /// # Errors
    ///
    /// Fails only if a body cannot be represented as JSON.
    pub fn into_request(self) -> serde_json::Result<Request<Value>> {
        let query_type = self.tag();
        let body = match self {
            Self::GetStatus => None,
            Self::GetConnections(filter) => filter.map(serde_json::to_value).transpose()?,
            Self::GetConnection(body) => Some(serde_json::to_value(body)?),
            Self::GetSchema(body) => Some(serde_json::to_value(body)?),
            Self::GetCredentialDefinition(body) => Some(serde_json::to_value(body)?),
            Self::GetCredentials(filter) => filter.map(serde_json::to_value).transpose()?,
            Self::GetCredentialExchangeRecords(filter)
            | Self::GetPresentationExchangeRecords(filter) => {
                filter.map(serde_json::to_value).transpose()?
            }
        };
        Ok(match body {
            Some(body) => Request::with_body(query_type, body),
            None => Request::new(query_type),
        })
    }
}

impl RecordFamily for Query {
    const FAMILY: &'static str = "query";
    const DISCRIMINANT: &'static str = TYPE;
    type Tag = QueryType;

    fn tag(&self) -> QueryType {
        match self {
            Self::GetStatus => QueryType::GetStatus,
            Self::GetConnections(_) => QueryType::GetConnections,
            Self::GetConnection(_) => QueryType::GetConnection,
            Self::GetSchema(_) => QueryType::GetSchema,
            Self::GetCredentialDefinition(_) => QueryType::GetCredentialDefinition,
            Self::GetCredentials(_) => QueryType::GetCredentials,
            Self::GetCredentialExchangeRecords(_) => QueryType::GetCredentialExchangeRecords,
            Self::GetPresentationExchangeRecords(_) => QueryType::GetPresentationExchangeRecords,
        }
    }

    fn narrow(tag: QueryType, envelope: &Value) -> serde_json::Result<Self> {
        use QueryType as Q;

        Ok(match tag {
            Q::GetStatus => Self::GetStatus,
            Q::GetConnections => Self::GetConnections(optional_field(envelope, BODY)?),
            Q::GetConnection => Self::GetConnection(variant_field(envelope, BODY)?),
            Q::GetSchema => Self::GetSchema(variant_field(envelope, BODY)?),
            Q::GetCredentialDefinition => {
                Self::GetCredentialDefinition(variant_field(envelope, BODY)?)
            }
            Q::GetCredentials => Self::GetCredentials(optional_field(envelope, BODY)?),
            Q::GetCredentialExchangeRecords => {
                Self::GetCredentialExchangeRecords(optional_field(envelope, BODY)?)
            }
            Q::GetPresentationExchangeRecords => {
                Self::GetPresentationExchangeRecords(optional_field(envelope, BODY)?)
            }
        })
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("Query", 2)?;
        envelope.serialize_field(TYPE, self.tag().as_str())?;
        match self {
            Self::GetStatus => envelope.skip_field(BODY)?,
            Self::GetConnections(filter) => serialize_optional(&mut envelope, filter.as_ref())?,
            Self::GetConnection(body) => envelope.serialize_field(BODY, body)?,
            Self::GetSchema(body) => envelope.serialize_field(BODY, body)?,
            Self::GetCredentialDefinition(body) => envelope.serialize_field(BODY, body)?,
            Self::GetCredentials(filter) => serialize_optional(&mut envelope, filter.as_ref())?,
            Self::GetCredentialExchangeRecords(filter)
            | Self::GetPresentationExchangeRecords(filter) => {
                serialize_optional(&mut envelope, filter.as_ref())?;
            }
        }
        envelope.end()
    }
}

fn serialize_optional<S, T>(envelope: &mut S, body: Option<&T>) -> Result<(), S::Error>
where
    S: SerializeStruct,
    T: Serialize,
{
    match body {
        Some(body) => envelope.serialize_field(BODY, body),
        None => envelope.skip_field(BODY),
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        controller_events::deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use controller_events::Classification;
    use serde_json::json;

    use super::*;

    #[test]
    fn queries_without_arguments_omit_body() {
        assert_eq!(
            serde_json::to_value(Query::GetStatus).expect("serialize"),
            json!({"type": "GET_STATUS"})
        );
        assert_eq!(
            serde_json::to_value(Query::GetConnections(None)).expect("serialize"),
            json!({"type": "GET_CONNECTIONS"})
        );
    }

    #[test]
    fn optional_bodies_classify_with_or_without_body() {
        let bare = Query::classify(&json!({"type": "GET_CONNECTIONS"}))
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(bare, Query::GetConnections(None));

        let filtered = Query::classify(&json!({
            "type": "GET_CONNECTIONS",
            "body": {"state": "active"}
        }))
        .expect("classify")
        .matched()
        .expect("matched");
        let Query::GetConnections(Some(filter)) = filtered else {
            panic!("expected a filter");
        };
        assert_eq!(filter.state, Some(ConnectionState::Active));
    }

    #[test]
    fn command_tags_are_not_queries() {
        let classified =
            Query::classify(&json!({"type": "CREATE_SCHEMA", "payload": {}})).expect("classify");
        assert!(matches!(classified, Classification::Unrecognized(_)));
    }

    #[test]
    fn typed_body_request() {
        let request = Request::of(SchemaRef {
            schema_id: SchemaId::new("WgWxqztrNooG92RXvxSTWv:2:degree:1.0").expect("id"),
        });
        assert_eq!(request.query_type(), QueryType::GetSchema);

        let erased = Query::GetSchema(request.body().cloned().expect("body"))
            .into_request()
            .expect("erase");
        assert_eq!(
            serde_json::to_value(&erased).expect("serialize"),
            serde_json::to_value(&request).expect("serialize")
        );
    }
}
