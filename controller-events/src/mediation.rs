//! Mediation records (`mediation` topic).

use controller_primitives::{ConnectionId, Discriminant, Timestamp, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Lifecycle of a mediation request.
    pub enum MediationState {
        /// Mediation requested.
        Request => "request",
        /// Mediator granted the request.
        Granted => "granted",
        /// Mediator denied the request.
        Denied => "denied",
    }
}

/// Role of this agent in the mediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediationRole {
    /// This agent mediates.
    Server,
    /// This agent is mediated.
    Client,
}

/// Fields common to every mediation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationBase {
    /// Record identifier.
    pub mediation_id: String,
    /// Connection to the mediator or mediated agent.
    pub connection_id: ConnectionId,
    /// Role of this agent.
    pub role: MediationRole,
    /// Terms stated by the mediator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mediator_terms: Vec<String>,
    /// Terms stated by the recipient.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_terms: Vec<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Mediation granted by the mediator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedMediation {
    /// Shared fields.
    #[serde(flatten)]
    pub base: MediationBase,
    /// Keys the mediator routes through.
    pub routing_keys: Vec<String>,
    /// Mediator endpoint.
    pub endpoint: String,
}

/// Mediation record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediationRecord {
    /// `request`
    Request(MediationBase),
    /// `granted`
    Granted(GrantedMediation),
    /// `denied`
    Denied(MediationBase),
}

impl MediationRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &MediationBase {
        match self {
            Self::Request(base) | Self::Denied(base) => base,
            Self::Granted(GrantedMediation { base, .. }) => base,
        }
    }
}

impl RecordFamily for MediationRecord {
    const FAMILY: &'static str = "mediation";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = MediationState;

    fn tag(&self) -> MediationState {
        match self {
            Self::Request(_) => MediationState::Request,
            Self::Granted(_) => MediationState::Granted,
            Self::Denied(_) => MediationState::Denied,
        }
    }

    fn narrow(tag: MediationState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            MediationState::Request => Self::Request(variant(envelope)?),
            MediationState::Granted => Self::Granted(variant(envelope)?),
            MediationState::Denied => Self::Denied(variant(envelope)?),
        })
    }
}

impl Tracked for MediationRecord {
    const TERMINAL: &'static [MediationState] = &[MediationState::Denied];

    fn record_id(&self) -> &str {
        &self.base().mediation_id
    }
}

impl Serialize for MediationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::Request(base) | Self::Denied(base) => {
                serialize_tagged(serializer, STATE, tag, base)
            }
            Self::Granted(granted) => serialize_tagged(serializer, STATE, tag, granted),
        }
    }
}

impl<'de> Deserialize<'de> for MediationRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn granted_mediation_carries_routing() {
        let envelope = json!({
            "mediation_id": "med-1",
            "connection_id": "abc",
            "role": "client",
            "state": "granted",
            "routing_keys": ["did:key:z6Mk"],
            "endpoint": "https://mediator.example/"
        });
        let record = MediationRecord::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        let MediationRecord::Granted(granted) = &record else {
            panic!("unexpected variant {record:?}");
        };
        assert_eq!(granted.routing_keys.len(), 1);
        assert_eq!(granted.base.role, MediationRole::Client);
        assert_eq!(record.record_id(), "med-1");
    }
}
