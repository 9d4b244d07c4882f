//! Inbound basic messages (`basicmessages` topic).

use controller_primitives::{ConnectionId, Discriminant, Timestamp, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Basic messages are only ever reported once, on receipt.
    pub enum BasicMessageState {
        /// Message received from a peer.
        Received => "received",
    }
}

/// A basic message received over a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicMessage {
    /// Connection the message arrived on.
    pub connection_id: ConnectionId,
    /// DIDComm message identifier.
    pub message_id: String,
    /// Message text.
    pub content: String,
    /// Time the peer stamped on the message.
    pub sent_time: Timestamp,
}

/// A basic message event narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicMessageRecord {
    /// `received`
    Received(BasicMessage),
}

impl BasicMessageRecord {
    /// The message.
    #[must_use]
    pub fn message(&self) -> &BasicMessage {
        match self {
            Self::Received(message) => message,
        }
    }
}

impl RecordFamily for BasicMessageRecord {
    const FAMILY: &'static str = "basic message";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = BasicMessageState;

    fn tag(&self) -> BasicMessageState {
        match self {
            Self::Received(_) => BasicMessageState::Received,
        }
    }

    fn narrow(tag: BasicMessageState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            BasicMessageState::Received => Self::Received(variant(envelope)?),
        })
    }
}

impl Tracked for BasicMessageRecord {
    const TERMINAL: &'static [BasicMessageState] = &[BasicMessageState::Received];

    fn record_id(&self) -> &str {
        &self.message().message_id
    }
}

impl Serialize for BasicMessageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, STATE, self.tag().as_str(), self.message())
    }
}

impl<'de> Deserialize<'de> for BasicMessageRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_received_message() {
        let envelope = json!({
            "connection_id": "abc",
            "message_id": "m-1",
            "content": "hello",
            "sent_time": "2024-03-01 10:15:30.123456Z",
            "state": "received"
        });
        let record = BasicMessageRecord::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(record.message().content, "hello");
        assert_eq!(record.record_id(), "m-1");
        assert_eq!(serde_json::to_value(&record).expect("serialize"), envelope);
    }
}
