//! Credential exchange records (`issue_credential` topic, issue-credential v1).

use controller_primitives::{
    ConnectionId, CredentialDefinitionId, CredentialExchangeId, Discriminant,
    RevocationRegistryId, SchemaId, ThreadId, Timestamp, discriminant,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};
use crate::common::{CredentialRole, Initiator};

discriminant! {
    /// Lifecycle of a credential exchange.
    pub enum CredentialExchangeState {
        /// Holder sent a credential proposal.
        ProposalSent => "proposal_sent",
        /// Issuer received a credential proposal.
        ProposalReceived => "proposal_received",
        /// Issuer sent a credential offer.
        OfferSent => "offer_sent",
        /// Holder received a credential offer.
        OfferReceived => "offer_received",
        /// Holder sent a credential request.
        RequestSent => "request_sent",
        /// Issuer received a credential request.
        RequestReceived => "request_received",
        /// Issuer issued the credential.
        CredentialIssued => "credential_issued",
        /// Holder received the credential.
        CredentialReceived => "credential_received",
        /// Exchange acknowledged; the holder stored the credential.
        CredentialAcked => "credential_acked",
        /// Issuer revoked the credential.
        CredentialRevoked => "credential_revoked",
        /// Exchange abandoned after a problem report.
        Abandoned => "abandoned",
    }
}

/// Fields common to every credential exchange state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialExchangeBase {
    /// Record identifier.
    pub credential_exchange_id: CredentialExchangeId,
    /// Protocol thread.
    pub thread_id: ThreadId,
    /// Which side started the exchange.
    pub initiator: Initiator,
    /// Role of this agent.
    pub role: CredentialRole,
    /// Connection the exchange runs over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Parent thread, for exchanges started from an out-of-band invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_thread_id: Option<String>,
    /// Schema of the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<SchemaId>,
    /// Whether the agent offers on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_offer: Option<bool>,
    /// Whether the agent issues on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_issue: Option<bool>,
    /// Whether the record is deleted once the exchange completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_remove: Option<bool>,
    /// Whether message tracing is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Exchange carrying a credential proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// The proposal message.
    pub credential_proposal_dict: Value,
}

/// Exchange carrying a credential offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Definition the offer is made against.
    pub credential_definition_id: CredentialDefinitionId,
    /// Indy credential offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_offer: Option<Value>,
}

/// Exchange carrying a credential request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Definition the request is made against.
    pub credential_definition_id: CredentialDefinitionId,
    /// Indy credential request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_request: Option<Value>,
}

/// Exchange after the issuer produced the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Definition of the issued credential.
    pub credential_definition_id: CredentialDefinitionId,
    /// Revocation registry the credential was issued into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoc_reg_id: Option<RevocationRegistryId>,
    /// Index of the credential in its revocation registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_id: Option<String>,
}

/// Exchange after the holder received the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Definition of the received credential.
    pub credential_definition_id: CredentialDefinitionId,
    /// Credential as received, before storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_credential: Option<Value>,
    /// Wallet identifier once stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

/// Exchange whose credential was revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Registry holding the revocation.
    pub revoc_reg_id: RevocationRegistryId,
    /// Index of the revoked credential.
    pub revocation_id: String,
}

/// Exchange abandoned after a problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedCredential {
    /// Shared fields.
    #[serde(flatten)]
    pub base: CredentialExchangeBase,
    /// Reason reported by the agent.
    pub error_msg: String,
}

/// A credential exchange record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialExchangeRecord {
    /// `proposal_sent`
    ProposalSent(ProposedCredential),
    /// `proposal_received`
    ProposalReceived(ProposedCredential),
    /// `offer_sent`
    OfferSent(OfferedCredential),
    /// `offer_received`
    OfferReceived(OfferedCredential),
    /// `request_sent`
    RequestSent(RequestedCredential),
    /// `request_received`
    RequestReceived(RequestedCredential),
    /// `credential_issued`
    CredentialIssued(IssuedCredential),
    /// `credential_received`
    CredentialReceived(ReceivedCredential),
    /// `credential_acked`
    CredentialAcked(ReceivedCredential),
    /// `credential_revoked`
    CredentialRevoked(RevokedCredential),
    /// `abandoned`
    Abandoned(AbandonedCredential),
}

impl CredentialExchangeRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &CredentialExchangeBase {
        match self {
            Self::ProposalSent(ProposedCredential { base, .. })
            | Self::ProposalReceived(ProposedCredential { base, .. })
            | Self::OfferSent(OfferedCredential { base, .. })
            | Self::OfferReceived(OfferedCredential { base, .. })
            | Self::RequestSent(RequestedCredential { base, .. })
            | Self::RequestReceived(RequestedCredential { base, .. })
            | Self::CredentialIssued(IssuedCredential { base, .. })
            | Self::CredentialReceived(ReceivedCredential { base, .. })
            | Self::CredentialAcked(ReceivedCredential { base, .. })
            | Self::CredentialRevoked(RevokedCredential { base, .. })
            | Self::Abandoned(AbandonedCredential { base, .. }) => base,
        }
    }

    /// Record identifier.
    #[must_use]
    pub fn credential_exchange_id(&self) -> &CredentialExchangeId {
        &self.base().credential_exchange_id
    }

    /// Credential definition, for states past the proposal.
    #[must_use]
    pub fn credential_definition_id(&self) -> Option<&CredentialDefinitionId> {
        match self {
            Self::OfferSent(offered) | Self::OfferReceived(offered) => {
                Some(&offered.credential_definition_id)
            }
            Self::RequestSent(requested) | Self::RequestReceived(requested) => {
                Some(&requested.credential_definition_id)
            }
            Self::CredentialIssued(issued) => Some(&issued.credential_definition_id),
            Self::CredentialReceived(received) | Self::CredentialAcked(received) => {
                Some(&received.credential_definition_id)
            }
            Self::ProposalSent(_)
            | Self::ProposalReceived(_)
            | Self::CredentialRevoked(_)
            | Self::Abandoned(_) => None,
        }
    }
}

impl RecordFamily for CredentialExchangeRecord {
    const FAMILY: &'static str = "credential exchange";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = CredentialExchangeState;

    fn tag(&self) -> CredentialExchangeState {
        use CredentialExchangeState as S;

        match self {
            Self::ProposalSent(_) => S::ProposalSent,
            Self::ProposalReceived(_) => S::ProposalReceived,
            Self::OfferSent(_) => S::OfferSent,
            Self::OfferReceived(_) => S::OfferReceived,
            Self::RequestSent(_) => S::RequestSent,
            Self::RequestReceived(_) => S::RequestReceived,
            Self::CredentialIssued(_) => S::CredentialIssued,
            Self::CredentialReceived(_) => S::CredentialReceived,
            Self::CredentialAcked(_) => S::CredentialAcked,
            Self::CredentialRevoked(_) => S::CredentialRevoked,
            Self::Abandoned(_) => S::Abandoned,
        }
    }

    fn narrow(tag: CredentialExchangeState, envelope: &Value) -> serde_json::Result<Self> {
        use CredentialExchangeState as S;

        Ok(match tag {
            S::ProposalSent => Self::ProposalSent(variant(envelope)?),
            S::ProposalReceived => Self::ProposalReceived(variant(envelope)?),
            S::OfferSent => Self::OfferSent(variant(envelope)?),
            S::OfferReceived => Self::OfferReceived(variant(envelope)?),
            S::RequestSent => Self::RequestSent(variant(envelope)?),
            S::RequestReceived => Self::RequestReceived(variant(envelope)?),
            S::CredentialIssued => Self::CredentialIssued(variant(envelope)?),
            S::CredentialReceived => Self::CredentialReceived(variant(envelope)?),
            S::CredentialAcked => Self::CredentialAcked(variant(envelope)?),
            S::CredentialRevoked => Self::CredentialRevoked(variant(envelope)?),
            S::Abandoned => Self::Abandoned(variant(envelope)?),
        })
    }
}

impl Tracked for CredentialExchangeRecord {
    const TERMINAL: &'static [CredentialExchangeState] = &[
        CredentialExchangeState::CredentialAcked,
        CredentialExchangeState::CredentialRevoked,
        CredentialExchangeState::Abandoned,
    ];

    fn record_id(&self) -> &str {
        self.credential_exchange_id().as_str()
    }
}

impl Serialize for CredentialExchangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::ProposalSent(proposed) | Self::ProposalReceived(proposed) => {
                serialize_tagged(serializer, STATE, tag, proposed)
            }
            Self::OfferSent(offered) | Self::OfferReceived(offered) => {
                serialize_tagged(serializer, STATE, tag, offered)
            }
            Self::RequestSent(requested) | Self::RequestReceived(requested) => {
                serialize_tagged(serializer, STATE, tag, requested)
            }
            Self::CredentialIssued(issued) => serialize_tagged(serializer, STATE, tag, issued),
            Self::CredentialReceived(received) | Self::CredentialAcked(received) => {
                serialize_tagged(serializer, STATE, tag, received)
            }
            Self::CredentialRevoked(revoked) => serialize_tagged(serializer, STATE, tag, revoked),
            Self::Abandoned(abandoned) => serialize_tagged(serializer, STATE, tag, abandoned),
        }
    }
}

impl<'de> Deserialize<'de> for CredentialExchangeRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::classify::ClassifyError;

    fn envelope(state: &str) -> Value {
        json!({
            "credential_exchange_id": "cred-ex-1",
            "thread_id": "thread-7",
            "connection_id": "abc",
            "initiator": "self",
            "role": "issuer",
            "state": state,
            "credential_proposal_dict": {"comment": "please"},
            "credential_definition_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
            "schema_id": "WgWxqztrNooG92RXvxSTWv:2:prefs:1.0",
            "revoc_reg_id": "WgWxqztrNooG92RXvxSTWv:4:reg",
            "revocation_id": "12",
            "error_msg": "abandoned by holder"
        })
    }

    #[test]
    fn every_state_selects_its_own_variant() {
        for state in CredentialExchangeState::ALL {
            let envelope = envelope(state.as_str());
            let record = CredentialExchangeRecord::classify(&envelope)
                .expect("classify")
                .matched()
                .expect("matched");
            assert_eq!(record.tag(), *state);
            let matching = CredentialExchangeState::ALL
                .iter()
                .filter(|candidate| CredentialExchangeRecord::is(**candidate, &envelope))
                .count();
            assert_eq!(matching, 1);
        }
    }

    #[test]
    fn offer_requires_credential_definition() {
        let mut envelope = envelope("offer_sent");
        envelope
            .as_object_mut()
            .expect("object")
            .remove("credential_definition_id");
        let err = CredentialExchangeRecord::classify(&envelope).expect_err("shape");
        assert!(matches!(err, ClassifyError::Shape { tag: "offer_sent", .. }));
    }

    #[test]
    fn round_trips_with_state() {
        let record: CredentialExchangeRecord =
            serde_json::from_value(envelope("credential_issued")).expect("deserialize");
        assert_eq!(
            record.credential_definition_id().map(CredentialDefinitionId::as_str),
            Some("WgWxqztrNooG92RXvxSTWv:3:CL:20:tag")
        );
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["state"], "credential_issued");
        assert_eq!(value["revocation_id"], "12");
        let back: CredentialExchangeRecord = serde_json::from_value(value).expect("round trip");
        assert_eq!(back, record);
    }
}
