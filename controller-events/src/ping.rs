//! Trust ping notifications (`ping` topic).

use controller_primitives::{ConnectionId, Discriminant, ThreadId, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Stage of a trust ping.
    pub enum PingState {
        /// A ping arrived from the peer.
        Received => "received",
        /// The peer answered our ping.
        ResponseReceived => "response_received",
    }
}

/// Payload of a trust ping notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingEvent {
    /// Connection the ping travelled over.
    pub connection_id: ConnectionId,
    /// Ping thread.
    pub thread_id: ThreadId,
    /// Optional comment carried by the ping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Whether a response was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded: Option<bool>,
}

/// A ping event narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingRecord {
    /// `received`
    Received(PingEvent),
    /// `response_received`
    ResponseReceived(PingEvent),
}

impl PingRecord {
    /// The notification payload.
    #[must_use]
    pub fn event(&self) -> &PingEvent {
        match self {
            Self::Received(event) | Self::ResponseReceived(event) => event,
        }
    }
}

impl RecordFamily for PingRecord {
    const FAMILY: &'static str = "ping";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = PingState;

    fn tag(&self) -> PingState {
        match self {
            Self::Received(_) => PingState::Received,
            Self::ResponseReceived(_) => PingState::ResponseReceived,
        }
    }

    fn narrow(tag: PingState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            PingState::Received => Self::Received(variant(envelope)?),
            PingState::ResponseReceived => Self::ResponseReceived(variant(envelope)?),
        })
    }
}

impl Tracked for PingRecord {
    const TERMINAL: &'static [PingState] = &[PingState::Received, PingState::ResponseReceived];

    fn record_id(&self) -> &str {
        self.event().thread_id.as_str()
    }
}

impl Serialize for PingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, STATE, self.tag().as_str(), self.event())
    }
}

impl<'de> Deserialize<'de> for PingRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}
