//! Commands the controller sends to the agent.

use std::collections::BTreeMap;

use controller_events::{Classification, ClassifyResult, RecordFamily, TYPE, variant_field};
use controller_primitives::registry::message_type;
use controller_primitives::{
    ConnectionId, CredentialDefinitionId, CredentialExchangeId, Discriminant,
    PresentationExchangeId, RevocationRegistryId, SchemaId, discriminant,
};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::envelope::{CommandPayload, Message};

const FAMILY: &str = "command";
const PAYLOAD: &str = "payload";

discriminant! {
    /// Tag of a command envelope.
    pub enum CommandType {
        /// See [`message_type::CREATE_SCHEMA`].
        CreateSchema => message_type::CREATE_SCHEMA,
        /// See [`message_type::CREATE_CREDENTIAL_DEFINITION`].
        CreateCredentialDefinition => message_type::CREATE_CREDENTIAL_DEFINITION,
        /// See [`message_type::CREATE_INVITATION`].
        CreateInvitation => message_type::CREATE_INVITATION,
        /// See [`message_type::RECEIVE_INVITATION`].
        ReceiveInvitation => message_type::RECEIVE_INVITATION,
        /// See [`message_type::ACCEPT_INVITATION`].
        AcceptInvitation => message_type::ACCEPT_INVITATION,
        /// See [`message_type::ACCEPT_REQUEST`].
        AcceptRequest => message_type::ACCEPT_REQUEST,
        /// See [`message_type::SEND_BASIC_MESSAGE`].
        SendBasicMessage => message_type::SEND_BASIC_MESSAGE,
        /// See [`message_type::SEND_PING`].
        SendPing => message_type::SEND_PING,
        /// See [`message_type::SEND_CREDENTIAL_OFFER`].
        SendCredentialOffer => message_type::SEND_CREDENTIAL_OFFER,
        /// See [`message_type::ISSUE_CREDENTIAL`].
        IssueCredential => message_type::ISSUE_CREDENTIAL,
        /// See [`message_type::STORE_CREDENTIAL`].
        StoreCredential => message_type::STORE_CREDENTIAL,
        /// See [`message_type::SEND_PRESENTATION_REQUEST`].
        SendPresentationRequest => message_type::SEND_PRESENTATION_REQUEST,
        /// See [`message_type::SEND_PRESENTATION`].
        SendPresentation => message_type::SEND_PRESENTATION,
        /// See [`message_type::VERIFY_PRESENTATION`].
        VerifyPresentation => message_type::VERIFY_PRESENTATION,
        /// See [`message_type::REVOKE_CREDENTIAL`].
        RevokeCredential => message_type::REVOKE_CREDENTIAL,
        /// See [`message_type::REMOVE_CONNECTION`].
        RemoveConnection => message_type::REMOVE_CONNECTION,
    }
}

macro_rules! command_payload {
    ($($payload:ty => $tag:ident),* $(,)?) => {
        $(
            impl CommandPayload for $payload {
                const TYPE: CommandType = CommandType::$tag;
            }
        )*
    };
}

/// Schema to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSendRequest {
    /// Schema name.
    pub schema_name: String,
    /// Schema version, e.g. `1.0`.
    pub schema_version: String,
    /// Attribute names.
    pub attributes: Vec<String>,
}

/// Credential definition to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionSendRequest {
    /// Schema the definition is based on.
    pub schema_id: SchemaId,
    /// Definition tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Whether credentials can be revoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_revocation: Option<bool>,
    /// Capacity of each revocation registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_registry_size: Option<u32>,
}

impl CredentialDefinitionSendRequest {
    /// A definition for `schema_id` with agent defaults.
    #[must_use]
    pub fn new(schema_id: SchemaId) -> Self {
        Self {
            schema_id,
            tag: None,
            support_revocation: None,
            revocation_registry_size: None,
        }
    }

    /// Sets the definition tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Enables revocation with registries of `size` credentials.
    #[must_use]
    pub fn with_revocation(mut self, size: u32) -> Self {
        self.support_revocation = Some(true);
        self.revocation_registry_size = Some(size);
        self
    }
}

/// Options for a new connection invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvitationRequest {
    /// Local alias for the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Accept the resulting request automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_accept: Option<bool>,
    /// Allow the invitation to be used more than once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_use: Option<bool>,
    /// Use the public DID in the invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// Label presented to the invitee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_label: Option<String>,
}

/// Invitation received out of band from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveInvitationRequest {
    /// The invitation message.
    pub invitation: Value,
    /// Local alias for the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Accept the invitation automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_accept: Option<bool>,
}

/// Accept a received invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptInvitationRequest {
    /// Connection created by the invitation.
    pub connection_id: ConnectionId,
    /// Label presented to the inviter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_label: Option<String>,
    /// Endpoint presented to the inviter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_endpoint: Option<String>,
}

/// Accept a received connection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptRequestRequest {
    /// Connection the request arrived on.
    pub connection_id: ConnectionId,
    /// Endpoint presented to the requester.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_endpoint: Option<String>,
}

/// Basic message to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendBasicMessageRequest {
    /// Connection to send over.
    pub connection_id: ConnectionId,
    /// Message text.
    pub content: String,
}

/// Trust ping to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPingRequest {
    /// Connection to ping.
    pub connection_id: ConnectionId,
    /// Optional comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One attribute of a credential preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
    /// MIME type of the value.
    #[serde(rename = "mime-type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl CredentialAttribute {
    /// A plain-text attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            mime_type: None,
        }
    }
}

/// Attribute values offered to the holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPreview {
    /// DIDComm message type of the preview.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub preview_type: Option<String>,
    /// Offered attributes.
    pub attributes: Vec<CredentialAttribute>,
}

/// Credential offer to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOfferRequest {
    /// Holder's connection.
    pub connection_id: ConnectionId,
    /// Definition of the offered credential.
    pub cred_def_id: CredentialDefinitionId,
    /// Offered attribute values.
    pub credential_preview: CredentialPreview,
    /// Human-readable comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Issue automatically once the holder requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_issue: Option<bool>,
    /// Remove the exchange record once done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_remove: Option<bool>,
    /// Enable message tracing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

impl CredentialOfferRequest {
    /// An offer of `attributes` under `cred_def_id`.
    #[must_use]
    pub fn new(
        connection_id: ConnectionId,
        cred_def_id: CredentialDefinitionId,
        attributes: Vec<CredentialAttribute>,
    ) -> Self {
        Self {
            connection_id,
            cred_def_id,
            credential_preview: CredentialPreview {
                preview_type: None,
                attributes,
            },
            comment: None,
            auto_issue: None,
            auto_remove: None,
            trace: None,
        }
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets whether the agent issues without further instruction.
    #[must_use]
    pub fn with_auto_issue(mut self, auto_issue: bool) -> Self {
        self.auto_issue = Some(auto_issue);
        self
    }
}

/// Issue the credential of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCredentialRequest {
    /// Exchange to answer.
    pub credential_exchange_id: CredentialExchangeId,
    /// Human-readable comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Store a received credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCredentialRequest {
    /// Exchange that delivered the credential.
    pub credential_exchange_id: CredentialExchangeId,
    /// Wallet identifier to store under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

/// Presentation request to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Prover's connection.
    pub connection_id: ConnectionId,
    /// Indy proof request.
    pub proof_request: Value,
    /// Human-readable comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Enable message tracing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

/// Presentation answering a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSpec {
    /// Exchange to answer.
    pub presentation_exchange_id: PresentationExchangeId,
    /// Requested attributes, by referent.
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, Value>,
    /// Requested predicates, by referent.
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, Value>,
    /// Self-attested attribute values, by referent.
    #[serde(default)]
    pub self_attested_attributes: BTreeMap<String, String>,
    /// Enable message tracing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

/// Verify a received presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPresentationRequest {
    /// Exchange holding the presentation.
    pub presentation_exchange_id: PresentationExchangeId,
}

/// Credential to revoke, by exchange or by registry index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeCredentialRequest {
    /// Exchange that issued the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_ex_id: Option<CredentialExchangeId>,
    /// Registry holding the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryId>,
    /// Index of the credential in the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_rev_id: Option<String>,
    /// Publish the revocation to the ledger immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
}

/// Connection to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveConnectionRequest {
    /// Connection to remove.
    pub connection_id: ConnectionId,
}

command_payload! {
    SchemaSendRequest => CreateSchema,
    CredentialDefinitionSendRequest => CreateCredentialDefinition,
    CreateInvitationRequest => CreateInvitation,
    ReceiveInvitationRequest => ReceiveInvitation,
    AcceptInvitationRequest => AcceptInvitation,
    AcceptRequestRequest => AcceptRequest,
    SendBasicMessageRequest => SendBasicMessage,
    SendPingRequest => SendPing,
    CredentialOfferRequest => SendCredentialOffer,
    IssueCredentialRequest => IssueCredential,
    StoreCredentialRequest => StoreCredential,
    ProofRequest => SendPresentationRequest,
    PresentationSpec => SendPresentation,
    VerifyPresentationRequest => VerifyPresentation,
    RevokeCredentialRequest => RevokeCredential,
    RemoveConnectionRequest => RemoveConnection,
}

/// A command narrowed by its `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CREATE_SCHEMA`
    CreateSchema(SchemaSendRequest),
    /// `CREATE_CREDENTIAL_DEFINITION`
    CreateCredentialDefinition(CredentialDefinitionSendRequest),
    /// `CREATE_INVITATION`
    CreateInvitation(CreateInvitationRequest),
    /// `RECEIVE_INVITATION`
    ReceiveInvitation(ReceiveInvitationRequest),
    /// `ACCEPT_INVITATION`
    AcceptInvitation(AcceptInvitationRequest),
    /// `ACCEPT_REQUEST`
    AcceptRequest(AcceptRequestRequest),
    /// `SEND_BASIC_MESSAGE`
    SendBasicMessage(SendBasicMessageRequest),
    /// `SEND_PING`
    SendPing(SendPingRequest),
    /// `SEND_CREDENTIAL_OFFER`
    SendCredentialOffer(CredentialOfferRequest),
    /// `ISSUE_CREDENTIAL`
    IssueCredential(IssueCredentialRequest),
    /// `STORE_CREDENTIAL`
    StoreCredential(StoreCredentialRequest),
    /// `SEND_PRESENTATION_REQUEST`
    SendPresentationRequest(ProofRequest),
    /// `SEND_PRESENTATION`
    SendPresentation(PresentationSpec),
    /// `VERIFY_PRESENTATION`
    VerifyPresentation(VerifyPresentationRequest),
    /// `REVOKE_CREDENTIAL`
    RevokeCredential(RevokeCredentialRequest),
    /// `REMOVE_CONNECTION`
    RemoveConnection(RemoveConnectionRequest),
}

impl Command {
    /// Tag of the command.
    #[must_use]
    pub fn message_type(&self) -> CommandType {
        self.tag()
    }

    /// Classifies an inbound `{ type, payload }` envelope.
    ///
    /// # Errors
    ///
    /// See [`controller_events::classify`].
    pub fn classify_envelope(envelope: &Value) -> ClassifyResult<Classification<Self>> {
        <Self as RecordFamily>::classify(envelope)
    }

    /// Erases the payload type, keeping the wire shape.
    ///
    /// # Errors
    ///
    /// Fails only if a payload cannot be represented as JSON.
    pub fn into_message(self) -> serde_json::Result<Message<Value>> {
        let message_type = self.tag();
        let payload = match self {
            Self::CreateSchema(payload) => serde_json::to_value(payload),
            Self::CreateCredentialDefinition(payload) => serde_json::to_value(payload),
            Self::CreateInvitation(payload) => serde_json::to_value(payload),
            Self::ReceiveInvitation(payload) => serde_json::to_value(payload),
            Self::AcceptInvitation(payload) => serde_json::to_value(payload),
            Self::AcceptRequest(payload) => serde_json::to_value(payload),
            Self::SendBasicMessage(payload) => serde_json::to_value(payload),
            Self::SendPing(payload) => serde_json::to_value(payload),
            Self::SendCredentialOffer(payload) => serde_json::to_value(payload),
            Self::IssueCredential(payload) => serde_json::to_value(payload),
            Self::StoreCredential(payload) => serde_json::to_value(payload),
            Self::SendPresentationRequest(payload) => serde_json::to_value(payload),
            Self::SendPresentation(payload) => serde_json::to_value(payload),
            Self::VerifyPresentation(payload) => serde_json::to_value(payload),
            Self::RevokeCredential(payload) => serde_json::to_value(payload),
            Self::RemoveConnection(payload) => serde_json::to_value(payload),
        }?;
        Ok(Message::new(message_type, payload))
    }
}

impl RecordFamily for Command {
    const FAMILY: &'static str = FAMILY;
    const DISCRIMINANT: &'static str = TYPE;
    type Tag = CommandType;

    fn tag(&self) -> CommandType {
        use CommandType as T;

        match self {
            Self::CreateSchema(_) => T::CreateSchema,
            Self::CreateCredentialDefinition(_) => T::CreateCredentialDefinition,
            Self::CreateInvitation(_) => T::CreateInvitation,
            Self::ReceiveInvitation(_) => T::ReceiveInvitation,
            Self::AcceptInvitation(_) => T::AcceptInvitation,
            Self::AcceptRequest(_) => T::AcceptRequest,
            Self::SendBasicMessage(_) => T::SendBasicMessage,
            Self::SendPing(_) => T::SendPing,
            Self::SendCredentialOffer(_) => T::SendCredentialOffer,
            Self::IssueCredential(_) => T::IssueCredential,
            Self::StoreCredential(_) => T::StoreCredential,
            Self::SendPresentationRequest(_) => T::SendPresentationRequest,
            Self::SendPresentation(_) => T::SendPresentation,
            Self::VerifyPresentation(_) => T::VerifyPresentation,
            Self::RevokeCredential(_) => T::RevokeCredential,
            Self::RemoveConnection(_) => T::RemoveConnection,
        }
    }

    fn narrow(tag: CommandType, envelope: &Value) -> serde_json::Result<Self> {
        use CommandType as T;

        Ok(match tag {
            T::CreateSchema => Self::CreateSchema(variant_field(envelope, PAYLOAD)?),
            T::CreateCredentialDefinition => {
                Self::CreateCredentialDefinition(variant_field(envelope, PAYLOAD)?)
            }
            T::CreateInvitation => Self::CreateInvitation(variant_field(envelope, PAYLOAD)?),
            T::ReceiveInvitation => Self::ReceiveInvitation(variant_field(envelope, PAYLOAD)?),
            T::AcceptInvitation => Self::AcceptInvitation(variant_field(envelope, PAYLOAD)?),
            T::AcceptRequest => Self::AcceptRequest(variant_field(envelope, PAYLOAD)?),
            T::SendBasicMessage => Self::SendBasicMessage(variant_field(envelope, PAYLOAD)?),
            T::SendPing => Self::SendPing(variant_field(envelope, PAYLOAD)?),
            T::SendCredentialOffer => {
                Self::SendCredentialOffer(variant_field(envelope, PAYLOAD)?)
            }
            T::IssueCredential => Self::IssueCredential(variant_field(envelope, PAYLOAD)?),
            T::StoreCredential => Self::StoreCredential(variant_field(envelope, PAYLOAD)?),
            T::SendPresentationRequest => {
                Self::SendPresentationRequest(variant_field(envelope, PAYLOAD)?)
            }
            T::SendPresentation => Self::SendPresentation(variant_field(envelope, PAYLOAD)?),
            T::VerifyPresentation => Self::VerifyPresentation(variant_field(envelope, PAYLOAD)?),
            T::RevokeCredential => Self::RevokeCredential(variant_field(envelope, PAYLOAD)?),
            T::RemoveConnection => Self::RemoveConnection(variant_field(envelope, PAYLOAD)?),
        })
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("Command", 2)?;
        envelope.serialize_field(TYPE, self.tag().as_str())?;
        match self {
            Self::CreateSchema(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::CreateCredentialDefinition(payload) => {
                envelope.serialize_field(PAYLOAD, payload)?;
            }
            Self::CreateInvitation(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::ReceiveInvitation(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::AcceptInvitation(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::AcceptRequest(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::SendBasicMessage(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::SendPing(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::SendCredentialOffer(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::IssueCredential(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::StoreCredential(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::SendPresentationRequest(payload) => {
                envelope.serialize_field(PAYLOAD, payload)?;
            }
            Self::SendPresentation(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::VerifyPresentation(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::RevokeCredential(payload) => envelope.serialize_field(PAYLOAD, payload)?,
            Self::RemoveConnection(payload) => envelope.serialize_field(PAYLOAD, payload)?,
        }
        envelope.end()
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        controller_events::deserialize_family(deserializer)
    }
}
