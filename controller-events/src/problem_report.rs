//! Problem reports received from peers (`problem_report` topic).
//!
//! Unlike the record topics, a problem report has no `state`; its body is the
//! DIDComm message itself.

use controller_primitives::ConnectionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::ThreadDecorator;

/// Coded, localized problem description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescription {
    /// Machine-readable problem code.
    pub code: String,
    /// English explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

/// A problem report message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    /// DIDComm message type URI.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// DIDComm message identifier.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Thread the problem refers to.
    #[serde(rename = "~thread", default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadDecorator>,
    /// What went wrong.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<ProblemDescription>,
    /// Connection the report arrived on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Items the problem concerns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problem_items: Vec<Value>,
}

impl ProblemReport {
    /// Problem code, if the peer sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.description.as_ref().map(|description| description.code.as_str())
    }

    /// Thread the report refers to.
    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        self.thread.as_ref().and_then(|thread| thread.thid.as_deref())
    }
}
