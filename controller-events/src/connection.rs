//! Pairwise connection records (`connections` topic).

use controller_primitives::{ConnectionId, Did, Discriminant, Timestamp, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};
use crate::common::Initiator;

discriminant! {
    /// Lifecycle of a pairwise connection.
    pub enum ConnectionState {
        /// Invitation created and handed out.
        InvitationSent => "invitation_sent",
        /// Invitation received from a peer.
        InvitationReceived => "invitation_received",
        /// Connection request sent to the inviter.
        RequestSent => "request_sent",
        /// Connection request received from an invitee.
        RequestReceived => "request_received",
        /// Connection response sent to the invitee.
        ResponseSent => "response_sent",
        /// Connection response received from the inviter.
        ResponseReceived => "response_received",
        /// Both sides hold each other's DIDs.
        Active => "active",
        /// Connection is no longer usable.
        Inactive => "inactive",
        /// The protocol failed.
        Error => "error",
    }
}

/// Mediation routing status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingState {
    /// No routing.
    None,
    /// Routing requested.
    Request,
    /// Routing in place.
    Active,
    /// Routing failed.
    Error,
}

/// Whether protocol steps are accepted automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptMode {
    /// Controller must accept each step.
    Manual,
    /// Agent accepts on its own.
    Auto,
}

/// How often an invitation may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationMode {
    /// Single use.
    Once,
    /// Reusable.
    Multi,
    /// Static, never consumed.
    Static,
}

/// Fields common to every connection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionBase {
    /// Record identifier.
    pub connection_id: ConnectionId,
    /// Which side created the invitation.
    pub initiator: Initiator,
    /// Mediation routing status.
    pub routing_state: RoutingState,
    /// Acceptance mode.
    pub accept: AcceptMode,
    /// Invitation reuse mode.
    pub invitation_mode: InvitationMode,
    /// Recipient key of the invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_key: Option<String>,
    /// Identifier of the invitation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_msg_id: Option<String>,
    /// Identifier of the connection request message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Label the peer advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_label: Option<String>,
    /// Role the peer plays in the protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_role: Option<String>,
    /// Public DID the peer connected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_public_did: Option<String>,
    /// Local alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Connection used for inbound routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_connection_id: Option<String>,
    /// Protocol that created the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_protocol: Option<String>,
    /// RFC 0023 spelling of the state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfc23_state: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Connection after this agent sent its request and pairwise DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedConnection {
    /// Shared fields.
    #[serde(flatten)]
    pub base: ConnectionBase,
    /// Our pairwise DID.
    pub my_did: Did,
}

/// Connection request received from an invitee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRequest {
    /// Shared fields.
    #[serde(flatten)]
    pub base: ConnectionBase,
    /// The requester's pairwise DID, when already stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_did: Option<Did>,
}

/// Connection where both pairwise DIDs are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstablishedConnection {
    /// Shared fields.
    #[serde(flatten)]
    pub base: ConnectionBase,
    /// Our pairwise DID.
    pub my_did: Did,
    /// The peer's pairwise DID.
    pub their_did: Did,
}

/// Connection that has been closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactiveConnection {
    /// Shared fields.
    #[serde(flatten)]
    pub base: ConnectionBase,
    /// Our pairwise DID, if one was exchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_did: Option<Did>,
    /// The peer's pairwise DID, if one was exchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_did: Option<Did>,
}

/// Connection whose protocol run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedConnection {
    /// Shared fields.
    #[serde(flatten)]
    pub base: ConnectionBase,
    /// Failure reported by the agent.
    pub error_msg: String,
}

/// A connection record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRecord {
    /// `invitation_sent`
    InvitationSent(ConnectionBase),
    /// `invitation_received`
    InvitationReceived(ConnectionBase),
    /// `request_sent`
    RequestSent(RequestedConnection),
    /// `request_received`
    RequestReceived(IncomingRequest),
    /// `response_sent`
    ResponseSent(EstablishedConnection),
    /// `response_received`
    ResponseReceived(EstablishedConnection),
    /// `active`
    Active(EstablishedConnection),
    /// `inactive`
    Inactive(InactiveConnection),
    /// `error`
    Error(FailedConnection),
}

impl ConnectionRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &ConnectionBase {
        match self {
            Self::InvitationSent(base) | Self::InvitationReceived(base) => base,
            Self::RequestSent(RequestedConnection { base, .. })
            | Self::RequestReceived(IncomingRequest { base, .. })
            | Self::ResponseSent(EstablishedConnection { base, .. })
            | Self::ResponseReceived(EstablishedConnection { base, .. })
            | Self::Active(EstablishedConnection { base, .. })
            | Self::Inactive(InactiveConnection { base, .. })
            | Self::Error(FailedConnection { base, .. }) => base,
        }
    }

    /// Record identifier.
    #[must_use]
    pub fn connection_id(&self) -> &ConnectionId {
        &self.base().connection_id
    }

    /// Our pairwise DID, when the state carries one.
    #[must_use]
    pub fn my_did(&self) -> Option<&Did> {
        match self {
            Self::RequestSent(requested) => Some(&requested.my_did),
            Self::ResponseSent(established)
            | Self::ResponseReceived(established)
            | Self::Active(established) => Some(&established.my_did),
            Self::Inactive(inactive) => inactive.my_did.as_ref(),
            Self::InvitationSent(_)
            | Self::InvitationReceived(_)
            | Self::RequestReceived(_)
            | Self::Error(_) => None,
        }
    }

    /// The peer's pairwise DID, when the state carries one.
    #[must_use]
    pub fn their_did(&self) -> Option<&Did> {
        match self {
            Self::RequestReceived(request) => request.their_did.as_ref(),
            Self::ResponseSent(established)
            | Self::ResponseReceived(established)
            | Self::Active(established) => Some(&established.their_did),
            Self::Inactive(inactive) => inactive.their_did.as_ref(),
            Self::InvitationSent(_)
            | Self::InvitationReceived(_)
            | Self::RequestSent(_)
            | Self::Error(_) => None,
        }
    }

    /// Returns `true` once messages can flow over the connection.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

impl RecordFamily for ConnectionRecord {
    const FAMILY: &'static str = "connection";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = ConnectionState;

    fn tag(&self) -> ConnectionState {
        match self {
            Self::InvitationSent(_) => ConnectionState::InvitationSent,
            Self::InvitationReceived(_) => ConnectionState::InvitationReceived,
            Self::RequestSent(_) => ConnectionState::RequestSent,
            Self::RequestReceived(_) => ConnectionState::RequestReceived,
            Self::ResponseSent(_) => ConnectionState::ResponseSent,
            Self::ResponseReceived(_) => ConnectionState::ResponseReceived,
            Self::Active(_) => ConnectionState::Active,
            Self::Inactive(_) => ConnectionState::Inactive,
            Self::Error(_) => ConnectionState::Error,
        }
    }

    fn narrow(tag: ConnectionState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            ConnectionState::InvitationSent => Self::InvitationSent(variant(envelope)?),
            ConnectionState::InvitationReceived => Self::InvitationReceived(variant(envelope)?),
            ConnectionState::RequestSent => Self::RequestSent(variant(envelope)?),
            ConnectionState::RequestReceived => Self::RequestReceived(variant(envelope)?),
            ConnectionState::ResponseSent => Self::ResponseSent(variant(envelope)?),
            ConnectionState::ResponseReceived => Self::ResponseReceived(variant(envelope)?),
            ConnectionState::Active => Self::Active(variant(envelope)?),
            ConnectionState::Inactive => Self::Inactive(variant(envelope)?),
            ConnectionState::Error => Self::Error(variant(envelope)?),
        })
    }
}

impl Tracked for ConnectionRecord {
    const TERMINAL: &'static [ConnectionState] = &[
        ConnectionState::Inactive,
        ConnectionState::Error,
    ];

    fn record_id(&self) -> &str {
        self.connection_id().as_str()
    }
}

impl Serialize for ConnectionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::InvitationSent(base) | Self::InvitationReceived(base) => {
                serialize_tagged(serializer, STATE, tag, base)
            }
            Self::RequestSent(requested) => serialize_tagged(serializer, STATE, tag, requested),
            Self::RequestReceived(request) => serialize_tagged(serializer, STATE, tag, request),
            Self::ResponseSent(established)
            | Self::ResponseReceived(established)
            | Self::Active(established) => serialize_tagged(serializer, STATE, tag, established),
            Self::Inactive(inactive) => serialize_tagged(serializer, STATE, tag, inactive),
            Self::Error(failed) => serialize_tagged(serializer, STATE, tag, failed),
        }
    }
}

impl<'de> Deserialize<'de> for ConnectionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}
