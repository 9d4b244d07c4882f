//! Presentation exchange records (`present_proof` topic, present-proof v1).

use controller_primitives::{
    ConnectionId, Discriminant, PresentationExchangeId, ThreadId, Timestamp, discriminant,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};
use crate::common::{Initiator, PresentationRole};

discriminant! {
    /// Lifecycle of a presentation exchange.
    pub enum PresentationExchangeState {
        /// Prover sent a presentation proposal.
        ProposalSent => "proposal_sent",
        /// Verifier received a presentation proposal.
        ProposalReceived => "proposal_received",
        /// Verifier sent a presentation request.
        RequestSent => "request_sent",
        /// Prover received a presentation request.
        RequestReceived => "request_received",
        /// Prover sent the presentation.
        PresentationSent => "presentation_sent",
        /// Verifier received the presentation.
        PresentationReceived => "presentation_received",
        /// Verifier checked the presentation.
        Verified => "verified",
        /// Prover received the verifier's acknowledgement.
        PresentationAcked => "presentation_acked",
        /// Exchange abandoned after a problem report.
        Abandoned => "abandoned",
    }
}

/// Verifier's verdict, which the agent encodes as the strings `"true"` and
/// `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Presentation verified.
    #[serde(rename = "true")]
    Valid,
    /// Presentation failed verification.
    #[serde(rename = "false")]
    Invalid,
}

/// Fields common to every presentation exchange state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationExchangeBase {
    /// Record identifier.
    pub presentation_exchange_id: PresentationExchangeId,
    /// Protocol thread.
    pub thread_id: ThreadId,
    /// Which side started the exchange.
    pub initiator: Initiator,
    /// Role of this agent.
    pub role: PresentationRole,
    /// Connection the exchange runs over; absent for connectionless requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Whether the agent answers requests on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_present: Option<bool>,
    /// Whether the agent verifies presentations on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_verify: Option<bool>,
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

/// Exchange carrying a presentation proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPresentation {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PresentationExchangeBase,
    /// The proposal message.
    pub presentation_proposal_dict: Value,
}

/// Exchange carrying an indy proof request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedPresentation {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PresentationExchangeBase,
    /// The indy proof request.
    pub presentation_request: Value,
}

/// Exchange carrying both the request and the presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedExchange {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PresentationExchangeBase,
    /// The indy proof request.
    pub presentation_request: Value,
    /// The indy proof.
    pub presentation: Value,
}

/// Exchange the verifier has checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPresentation {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PresentationExchangeBase,
    /// The indy proof request.
    pub presentation_request: Value,
    /// The indy proof.
    pub presentation: Value,
    /// Verification outcome.
    pub verified: Verdict,
    /// Diagnostics emitted by the verifier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verified_msgs: Vec<String>,
}

/// Exchange abandoned after a problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedPresentation {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PresentationExchangeBase,
    /// Reason reported by the agent.
    pub error_msg: String,
}

/// A presentation exchange record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationExchangeRecord {
    /// `proposal_sent`
    ProposalSent(ProposedPresentation),
    /// `proposal_received`
    ProposalReceived(ProposedPresentation),
    /// `request_sent`
    RequestSent(RequestedPresentation),
    /// `request_received`
    RequestReceived(RequestedPresentation),
    /// `presentation_sent`
    PresentationSent(PresentedExchange),
    /// `presentation_received`
    PresentationReceived(PresentedExchange),
    /// `verified`
    Verified(VerifiedPresentation),
    /// `presentation_acked`
    PresentationAcked(PresentationExchangeBase),
    /// `abandoned`
    Abandoned(AbandonedPresentation),
}

impl PresentationExchangeRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &PresentationExchangeBase {
        match self {
            Self::ProposalSent(ProposedPresentation { base, .. })
            | Self::ProposalReceived(ProposedPresentation { base, .. })
            | Self::RequestSent(RequestedPresentation { base, .. })
            | Self::RequestReceived(RequestedPresentation { base, .. })
            | Self::PresentationSent(PresentedExchange { base, .. })
            | Self::PresentationReceived(PresentedExchange { base, .. })
            | Self::Verified(VerifiedPresentation { base, .. })
            | Self::Abandoned(AbandonedPresentation { base, .. })
            | Self::PresentationAcked(base) => base,
        }
    }

    /// Record identifier.
    #[must_use]
    pub fn presentation_exchange_id(&self) -> &PresentationExchangeId {
        &self.base().presentation_exchange_id
    }

    /// The proof request, once one has been exchanged.
    #[must_use]
    pub fn presentation_request(&self) -> Option<&Value> {
        match self {
            Self::RequestSent(requested) | Self::RequestReceived(requested) => {
                Some(&requested.presentation_request)
            }
            Self::PresentationSent(presented) | Self::PresentationReceived(presented) => {
                Some(&presented.presentation_request)
            }
            Self::Verified(verified) => Some(&verified.presentation_request),
            Self::ProposalSent(_)
            | Self::ProposalReceived(_)
            | Self::PresentationAcked(_)
            | Self::Abandoned(_) => None,
        }
    }

    /// Verification outcome; only `verified` records carry one.
    #[must_use]
    pub fn verified(&self) -> Option<bool> {
        match self {
            Self::Verified(verified) => Some(verified.verified == Verdict::Valid),
            _ => None,
        }
    }
}

impl RecordFamily for PresentationExchangeRecord {
    const FAMILY: &'static str = "presentation exchange";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = PresentationExchangeState;

    fn tag(&self) -> PresentationExchangeState {
        match self {
            Self::ProposalSent(_) => PresentationExchangeState::ProposalSent,
            Self::ProposalReceived(_) => PresentationExchangeState::ProposalReceived,
            Self::RequestSent(_) => PresentationExchangeState::RequestSent,
            Self::RequestReceived(_) => PresentationExchangeState::RequestReceived,
            Self::PresentationSent(_) => PresentationExchangeState::PresentationSent,
            Self::PresentationReceived(_) => PresentationExchangeState::PresentationReceived,
            Self::Verified(_) => PresentationExchangeState::Verified,
            Self::PresentationAcked(_) => PresentationExchangeState::PresentationAcked,
            Self::Abandoned(_) => PresentationExchangeState::Abandoned,
        }
    }

    fn narrow(tag: PresentationExchangeState, envelope: &Value) -> serde_json::Result<Self> {
        use PresentationExchangeState as S;

        Ok(match tag {
            S::ProposalSent => Self::ProposalSent(variant(envelope)?),
            S::ProposalReceived => Self::ProposalReceived(variant(envelope)?),
            S::RequestSent => Self::RequestSent(variant(envelope)?),
            S::RequestReceived => Self::RequestReceived(variant(envelope)?),
            S::PresentationSent => Self::PresentationSent(variant(envelope)?),
            S::PresentationReceived => Self::PresentationReceived(variant(envelope)?),
            S::Verified => Self::Verified(variant(envelope)?),
            S::PresentationAcked => Self::PresentationAcked(variant(envelope)?),
            S::Abandoned => Self::Abandoned(variant(envelope)?),
        })
    }
}

impl Tracked for PresentationExchangeRecord {
    const TERMINAL: &'static [PresentationExchangeState] = &[
        PresentationExchangeState::Verified,
        PresentationExchangeState::PresentationAcked,
        PresentationExchangeState::Abandoned,
    ];

    fn record_id(&self) -> &str {
        self.presentation_exchange_id().as_str()
    }
}

impl Serialize for PresentationExchangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::ProposalSent(proposed) | Self::ProposalReceived(proposed) => {
                serialize_tagged(serializer, STATE, tag, proposed)
            }
            Self::RequestSent(requested) | Self::RequestReceived(requested) => {
                serialize_tagged(serializer, STATE, tag, requested)
            }
            Self::PresentationSent(presented) | Self::PresentationReceived(presented) => {
                serialize_tagged(serializer, STATE, tag, presented)
            }
            Self::Verified(verified) => serialize_tagged(serializer, STATE, tag, verified),
            Self::PresentationAcked(base) => serialize_tagged(serializer, STATE, tag, base),
            Self::Abandoned(abandoned) => serialize_tagged(serializer, STATE, tag, abandoned),
        }
    }
}

impl<'de> Deserialize<'de> for PresentationExchangeRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(state: &str) -> Value {
        json!({
            "presentation_exchange_id": "pres-1",
            "thread_id": "thread-1",
            "connection_id": "abc",
            "initiator": "self",
            "role": "verifier",
            "state": state,
            "presentation_proposal_dict": {"comment": "proposal"},
            "presentation_request": {"name": "proof", "version": "1.0"},
            "presentation": {"proof": {}},
            "verified": "true",
            "error_msg": "declined"
        })
    }

    #[test]
    fn every_state_selects_its_own_variant() {
        for state in PresentationExchangeState::ALL {
            let record = PresentationExchangeRecord::classify(&envelope(state.as_str()))
                .expect("classify")
                .matched()
                .expect("matched");
            assert_eq!(record.tag(), *state);
            assert_eq!(record.record_id(), "pres-1");
        }
    }

    #[test]
    fn verdict_is_read_from_string_flag() {
        let mut rejected = envelope("verified");
        rejected["verified"] = json!("false");
        let record: PresentationExchangeRecord =
            serde_json::from_value(rejected).expect("deserialize");
        assert_eq!(record.verified(), Some(false));

        let accepted: PresentationExchangeRecord =
            serde_json::from_value(envelope("verified")).expect("deserialize");
        assert_eq!(accepted.verified(), Some(true));
        assert!(accepted.presentation_request().is_some());
    }

    #[test]
    fn connection_envelope_is_not_a_presentation() {
        let connection = json!({
            "connection_id": "abc",
            "state": "request_received",
            "initiator": "external",
            "invitation_key": "k1",
            "routing_state": "none",
            "accept": "auto",
            "invitation_mode": "once"
        });
        assert!(
            PresentationExchangeState::ALL
                .iter()
                .all(|state| !PresentationExchangeRecord::is(*state, &connection))
        );
    }
}
