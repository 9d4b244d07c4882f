//! Endorsement transaction records (`endorse_transaction` topic).

use controller_primitives::{ConnectionId, Discriminant, Timestamp, discriminant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Lifecycle of a ledger transaction routed through an endorser.
    pub enum TransactionState {
        /// Author created the transaction.
        TransactionCreated => "transaction_created",
        /// Author sent the endorsement request.
        RequestSent => "request_sent",
        /// Endorser received the endorsement request.
        RequestReceived => "request_received",
        /// Endorser signed the transaction.
        TransactionEndorsed => "transaction_endorsed",
        /// Endorser refused to sign.
        TransactionRefused => "transaction_refused",
        /// Author resent the request.
        TransactionResent => "transaction_resent",
        /// Endorser received a resent request.
        TransactionResentReceived => "transaction_resent_received",
        /// Author cancelled the transaction.
        TransactionCancelled => "transaction_cancelled",
        /// Transaction written and acknowledged.
        TransactionAcked => "transaction_acked",
    }
}

/// Fields common to every transaction state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBase {
    /// Record identifier.
    pub transaction_id: String,
    /// Connection to the endorser or author.
    pub connection_id: ConnectionId,
    /// Protocol thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Attached ledger request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages_attach: Vec<Value>,
    /// Signature requests sent to the endorser.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature_request: Vec<Value>,
    /// Attachment formats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<Value>,
    /// Expiry and timing constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Value>,
    /// Context needed to finish the write once endorsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Value>,
    /// Whether the endorser writes the transaction itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorser_write_txn: Option<bool>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Transaction the endorser has answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredTransaction {
    /// Shared fields.
    #[serde(flatten)]
    pub base: TransactionBase,
    /// Endorser's signature responses.
    pub signature_response: Vec<Value>,
}

/// Endorsement transaction record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRecord {
    /// `transaction_created`
    TransactionCreated(TransactionBase),
    /// `request_sent`
    RequestSent(TransactionBase),
    /// `request_received`
    RequestReceived(TransactionBase),
    /// `transaction_endorsed`
    TransactionEndorsed(AnsweredTransaction),
    /// `transaction_refused`
    TransactionRefused(AnsweredTransaction),
    /// `transaction_resent`
    TransactionResent(TransactionBase),
    /// `transaction_resent_received`
    TransactionResentReceived(TransactionBase),
    /// `transaction_cancelled`
    TransactionCancelled(TransactionBase),
    /// `transaction_acked`
    TransactionAcked(TransactionBase),
}

impl TransactionRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &TransactionBase {
        match self {
            Self::TransactionCreated(base)
            | Self::RequestSent(base)
            | Self::RequestReceived(base)
            | Self::TransactionResent(base)
            | Self::TransactionResentReceived(base)
            | Self::TransactionCancelled(base)
            | Self::TransactionAcked(base) => base,
            Self::TransactionEndorsed(AnsweredTransaction { base, .. })
            | Self::TransactionRefused(AnsweredTransaction { base, .. }) => base,
        }
    }
}

impl RecordFamily for TransactionRecord {
    const FAMILY: &'static str = "endorse transaction";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = TransactionState;

    fn tag(&self) -> TransactionState {
        use TransactionState as S;

        match self {
            Self::TransactionCreated(_) => S::TransactionCreated,
            Self::RequestSent(_) => S::RequestSent,
            Self::RequestReceived(_) => S::RequestReceived,
            Self::TransactionEndorsed(_) => S::TransactionEndorsed,
            Self::TransactionRefused(_) => S::TransactionRefused,
            Self::TransactionResent(_) => S::TransactionResent,
            Self::TransactionResentReceived(_) => S::TransactionResentReceived,
            Self::TransactionCancelled(_) => S::TransactionCancelled,
            Self::TransactionAcked(_) => S::TransactionAcked,
        }
    }

    fn narrow(tag: TransactionState, envelope: &Value) -> serde_json::Result<Self> {
        use TransactionState as S;

        Ok(match tag {
            S::TransactionCreated => Self::TransactionCreated(variant(envelope)?),
            S::RequestSent => Self::RequestSent(variant(envelope)?),
            S::RequestReceived => Self::RequestReceived(variant(envelope)?),
            S::TransactionEndorsed => Self::TransactionEndorsed(variant(envelope)?),
            S::TransactionRefused => Self::TransactionRefused(variant(envelope)?),
            S::TransactionResent => Self::TransactionResent(variant(envelope)?),
            S::TransactionResentReceived => Self::TransactionResentReceived(variant(envelope)?),
            S::TransactionCancelled => Self::TransactionCancelled(variant(envelope)?),
            S::TransactionAcked => Self::TransactionAcked(variant(envelope)?),
        })
    }
}

impl Tracked for TransactionRecord {
    const TERMINAL: &'static [TransactionState] = &[
        TransactionState::TransactionRefused,
        TransactionState::TransactionCancelled,
        TransactionState::TransactionAcked,
    ];

    fn record_id(&self) -> &str {
        &self.base().transaction_id
    }
}

impl Serialize for TransactionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::TransactionEndorsed(answered) | Self::TransactionRefused(answered) => {
                serialize_tagged(serializer, STATE, tag, answered)
            }
            Self::TransactionCreated(base)
            | Self::RequestSent(base)
            | Self::RequestReceived(base)
            | Self::TransactionResent(base)
            | Self::TransactionResentReceived(base)
            | Self::TransactionCancelled(base)
            | Self::TransactionAcked(base) => serialize_tagged(serializer, STATE, tag, base),
        }
    }
}

impl<'de> Deserialize<'de> for TransactionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}
