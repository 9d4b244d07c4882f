//! Out-of-band invitation records (`out_of_band` topic).

use controller_primitives::{ConnectionId, Discriminant, Timestamp, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Lifecycle of an out-of-band invitation. The agent spells these with
    /// hyphens.
    pub enum OobState {
        /// Invitation created.
        Initial => "initial",
        /// Receiver preparing its response.
        PrepareResponse => "prepare-response",
        /// Sender waiting for the receiver.
        AwaitResponse => "await-response",
        /// Receiver's connection reuse was refused.
        ReuseNotAccepted => "reuse-not-accepted",
        /// Receiver's connection reuse was accepted.
        ReuseAccepted => "reuse-accepted",
        /// Invitation handled.
        Done => "done",
    }
}

/// Role of this agent for the invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OobRole {
    /// This agent created the invitation.
    Sender,
    /// This agent received the invitation.
    Receiver,
}

/// Out-of-band record. Every state shares this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oob {
    /// Record identifier.
    pub oob_id: String,
    /// Identifier of the invitation message.
    pub invi_msg_id: String,
    /// Role of this agent.
    pub role: OobRole,
    /// The invitation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Value>,
    /// Connection created or reused for the invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Thread of the request attached to the invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach_thread_id: Option<String>,
    /// Recipient key of the invitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub our_recipient_key: Option<String>,
    /// Whether the invitation can be used more than once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_use: Option<bool>,
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

/// Out-of-band record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OobRecord {
    /// `initial`
    Initial(Oob),
    /// `prepare-response`
    PrepareResponse(Oob),
    /// `await-response`
    AwaitResponse(Oob),
    /// `reuse-not-accepted`
    ReuseNotAccepted(Oob),
    /// `reuse-accepted`
    ReuseAccepted(Oob),
    /// `done`
    Done(Oob),
}

impl OobRecord {
    /// The record body.
    #[must_use]
    pub fn record(&self) -> &Oob {
        match self {
            Self::Initial(oob)
            | Self::PrepareResponse(oob)
            | Self::AwaitResponse(oob)
            | Self::ReuseNotAccepted(oob)
            | Self::ReuseAccepted(oob)
            | Self::Done(oob) => oob,
        }
    }
}

impl RecordFamily for OobRecord {
    const FAMILY: &'static str = "out-of-band";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = OobState;

    fn tag(&self) -> OobState {
        match self {
            Self::Initial(_) => OobState::Initial,
            Self::PrepareResponse(_) => OobState::PrepareResponse,
            Self::AwaitResponse(_) => OobState::AwaitResponse,
            Self::ReuseNotAccepted(_) => OobState::ReuseNotAccepted,
            Self::ReuseAccepted(_) => OobState::ReuseAccepted,
            Self::Done(_) => OobState::Done,
        }
    }

    fn narrow(tag: OobState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            OobState::Initial => Self::Initial(variant(envelope)?),
            OobState::PrepareResponse => Self::PrepareResponse(variant(envelope)?),
            OobState::AwaitResponse => Self::AwaitResponse(variant(envelope)?),
            OobState::ReuseNotAccepted => Self::ReuseNotAccepted(variant(envelope)?),
            OobState::ReuseAccepted => Self::ReuseAccepted(variant(envelope)?),
            OobState::Done => Self::Done(variant(envelope)?),
        })
    }
}

impl Tracked for OobRecord {
    const TERMINAL: &'static [OobState] = &[OobState::ReuseNotAccepted, OobState::Done];

    fn record_id(&self) -> &str {
        &self.record().oob_id
    }
}

impl Serialize for OobRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, STATE, self.tag().as_str(), self.record())
    }
}

impl<'de> Deserialize<'de> for OobRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn hyphenated_states_are_matched_verbatim() {
        let envelope = json!({
            "oob_id": "oob-1",
            "invi_msg_id": "inv-1",
            "role": "sender",
            "state": "await-response"
        });
        let record = OobRecord::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(record.tag(), OobState::AwaitResponse);

        let underscored = json!({
            "oob_id": "oob-1",
            "invi_msg_id": "inv-1",
            "role": "sender",
            "state": "await_response"
        });
        assert!(!OobRecord::classify(&underscored).expect("classify").is_match());
    }
}
