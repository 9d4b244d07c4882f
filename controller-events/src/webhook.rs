//! Webhook envelopes and their two-level classification.
//!
//! The agent posts every record update to `<webhook_url>/topic/<topic>/`. The
//! topic selects the record family; the body's `state` then selects the
//! variant within it.

use controller_primitives::{Discriminant, Topic};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::basic_message::BasicMessageRecord;
use crate::classify::{
    Classification, ClassifyError, ClassifyResult, RecordFamily, TYPE, Unrecognized, classify,
    discriminant_of, variant,
};
use crate::connection::ConnectionRecord;
use crate::credential::CredentialExchangeRecord;
use crate::endorsement::TransactionRecord;
use crate::mediation::MediationRecord;
use crate::out_of_band::OobRecord;
use crate::ping::PingRecord;
use crate::presentation::PresentationExchangeRecord;
use crate::problem_report::ProblemReport;
use crate::revocation::{IssuerCredRevRecord, RevocationRegistryRecord};

const FAMILY: &str = "webhook";
const BODY: &str = "body";

/// Inbound `{ type, body }` webhook envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Raw topic tag. Kept as text so unknown topics survive until dispatch.
    #[serde(rename = "type")]
    pub topic: String,
    /// Record or message posted under the topic.
    #[serde(default)]
    pub body: Value,
}

impl WebhookEnvelope {
    /// Builds an envelope for a known topic.
    #[must_use]
    pub fn from_topic(topic: Topic, body: Value) -> Self {
        Self {
            topic: topic.as_str().to_owned(),
            body,
        }
    }

    /// Builds an envelope from the agent's callback path,
    /// `<prefix>/topic/<topic>/`. The trailing slash is optional.
    ///
    /// Returns `None` when `path` is not a topic route under `prefix`. Unknown
    /// topic names are accepted here and reported as unrecognized when the
    /// envelope is classified.
    #[must_use]
    pub fn from_path(prefix: &str, path: &str, body: Value) -> Option<Self> {
        let rest = path.strip_prefix(prefix.trim_end_matches('/'))?;
        let topic = rest.strip_prefix("/topic/")?;
        let topic = topic.strip_suffix('/').unwrap_or(topic);
        if topic.is_empty() || topic.contains('/') {
            return None;
        }
        Some(Self {
            topic: topic.to_owned(),
            body,
        })
    }

    /// Topic, when it is one the registry knows.
    #[must_use]
    pub fn known_topic(&self) -> Option<Topic> {
        Topic::from_tag(&self.topic)
    }

    /// Classifies the body against the family registered for the topic.
    ///
    /// # Errors
    ///
    /// See [`WebhookEvent::from_parts`].
    pub fn classify(&self) -> ClassifyResult<Classification<WebhookEvent>> {
        classify_parts(&self.topic, &self.body)
    }
}

/// A webhook body narrowed by topic and then by state.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// `connections`
    Connection(ConnectionRecord),
    /// `present_proof`
    PresentProof(PresentationExchangeRecord),
    /// `issue_credential`
    IssueCredential(CredentialExchangeRecord),
    /// `basicmessages`
    BasicMessage(BasicMessageRecord),
    /// `issuer_cred_rev`
    IssuerCredRev(IssuerCredRevRecord),
    /// `revocation_registry`
    RevocationRegistry(RevocationRegistryRecord),
    /// `mediation`
    Mediation(MediationRecord),
    /// `endorse_transaction`
    EndorseTransaction(TransactionRecord),
    /// `out_of_band`
    OutOfBand(OobRecord),
    /// `ping`
    Ping(PingRecord),
    /// `problem_report`
    ProblemReport(ProblemReport),
}

impl WebhookEvent {
    /// Classifies a raw `{ type, body }` envelope.
    ///
    /// An unknown topic, or an unknown state within a known topic, yields
    /// [`Classification::Unrecognized`].
    ///
    /// # Errors
    ///
    /// Fails when `type` is missing or not a string, when `body` is missing,
    /// or when the body is malformed for its family.
    pub fn classify(envelope: &Value) -> ClassifyResult<Classification<Self>> {
        let topic = discriminant_of(envelope, FAMILY, TYPE)?;
        let body = envelope.get(BODY).ok_or(ClassifyError::MissingField {
            family: FAMILY,
            field: BODY,
        })?;
        classify_parts(topic, body)
    }

    /// Classifies a body posted under a known topic.
    ///
    /// # Errors
    ///
    /// Fails when the body is malformed for the topic's family. For record
    /// topics see [`classify`]; a problem report fails with
    /// [`ClassifyError::Shape`] when it is not a problem-report object.
    pub fn from_parts(topic: Topic, body: &Value) -> ClassifyResult<Classification<Self>> {
        Ok(match topic {
            Topic::Connections => classify::<ConnectionRecord>(body)?.map(Self::Connection),
            Topic::PresentProof => {
                classify::<PresentationExchangeRecord>(body)?.map(Self::PresentProof)
            }
            Topic::IssueCredential => {
                classify::<CredentialExchangeRecord>(body)?.map(Self::IssueCredential)
            }
            Topic::BasicMessages => classify::<BasicMessageRecord>(body)?.map(Self::BasicMessage),
            Topic::IssuerCredRev => classify::<IssuerCredRevRecord>(body)?.map(Self::IssuerCredRev),
            Topic::RevocationRegistry => {
                classify::<RevocationRegistryRecord>(body)?.map(Self::RevocationRegistry)
            }
            Topic::Mediation => classify::<MediationRecord>(body)?.map(Self::Mediation),
            Topic::EndorseTransaction => {
                classify::<TransactionRecord>(body)?.map(Self::EndorseTransaction)
            }
            Topic::OutOfBand => classify::<OobRecord>(body)?.map(Self::OutOfBand),
            Topic::Ping => classify::<PingRecord>(body)?.map(Self::Ping),
            Topic::ProblemReport => {
                let report = variant(body).map_err(|source| ClassifyError::Shape {
                    family: "problem report",
                    tag: topic.as_str(),
                    source,
                })?;
                Classification::Matched(Self::ProblemReport(report))
            }
        })
    }

    /// Topic the event was posted under.
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::Connection(_) => Topic::Connections,
            Self::PresentProof(_) => Topic::PresentProof,
            Self::IssueCredential(_) => Topic::IssueCredential,
            Self::BasicMessage(_) => Topic::BasicMessages,
            Self::IssuerCredRev(_) => Topic::IssuerCredRev,
            Self::RevocationRegistry(_) => Topic::RevocationRegistry,
            Self::Mediation(_) => Topic::Mediation,
            Self::EndorseTransaction(_) => Topic::EndorseTransaction,
            Self::OutOfBand(_) => Topic::OutOfBand,
            Self::Ping(_) => Topic::Ping,
            Self::ProblemReport(_) => Topic::ProblemReport,
        }
    }

    /// State tag of the record, if the topic carries one.
    #[must_use]
    pub fn state(&self) -> Option<&'static str> {
        Some(match self {
            Self::Connection(record) => record.tag().as_str(),
            Self::PresentProof(record) => record.tag().as_str(),
            Self::IssueCredential(record) => record.tag().as_str(),
            Self::BasicMessage(record) => record.tag().as_str(),
            Self::IssuerCredRev(record) => record.tag().as_str(),
            Self::RevocationRegistry(record) => record.tag().as_str(),
            Self::Mediation(record) => record.tag().as_str(),
            Self::EndorseTransaction(record) => record.tag().as_str(),
            Self::OutOfBand(record) => record.tag().as_str(),
            Self::Ping(record) => record.tag().as_str(),
            Self::ProblemReport(_) => return None,
        })
    }
}

impl Serialize for WebhookEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("WebhookEvent", 2)?;
        envelope.serialize_field(TYPE, self.topic().as_str())?;
        match self {
            Self::Connection(record) => envelope.serialize_field(BODY, record)?,
            Self::PresentProof(record) => envelope.serialize_field(BODY, record)?,
            Self::IssueCredential(record) => envelope.serialize_field(BODY, record)?,
            Self::BasicMessage(record) => envelope.serialize_field(BODY, record)?,
            Self::IssuerCredRev(record) => envelope.serialize_field(BODY, record)?,
            Self::RevocationRegistry(record) => envelope.serialize_field(BODY, record)?,
            Self::Mediation(record) => envelope.serialize_field(BODY, record)?,
            Self::EndorseTransaction(record) => envelope.serialize_field(BODY, record)?,
            Self::OutOfBand(record) => envelope.serialize_field(BODY, record)?,
            Self::Ping(record) => envelope.serialize_field(BODY, record)?,
            Self::ProblemReport(report) => envelope.serialize_field(BODY, report)?,
        }
        envelope.end()
    }
}

fn classify_parts(raw_topic: &str, body: &Value) -> ClassifyResult<Classification<WebhookEvent>> {
    match Topic::from_tag(raw_topic) {
        Some(topic) => WebhookEvent::from_parts(topic, body),
        None => {
            debug!(topic = raw_topic, "unrecognized webhook topic");
            Ok(Classification::Unrecognized(Unrecognized {
                family: FAMILY,
                discriminant: TYPE,
                tag: raw_topic.to_owned(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::connection::ConnectionState;

    fn connection_body() -> Value {
        json!({
            "connection_id": "abc",
            "state": "request_received",
            "initiator": "external",
            "routing_state": "none",
            "accept": "manual",
            "invitation_mode": "once"
        })
    }

    #[test]
    fn path_parsing() {
        let envelope =
            WebhookEnvelope::from_path("/webhooks", "/webhooks/topic/connections/", json!({}))
                .expect("route");
        assert_eq!(envelope.known_topic(), Some(Topic::Connections));

        let no_slash = WebhookEnvelope::from_path("/webhooks/", "/webhooks/topic/ping", json!({}))
            .expect("route");
        assert_eq!(no_slash.topic, "ping");

        assert!(WebhookEnvelope::from_path("/webhooks", "/other/topic/ping/", json!({})).is_none());
        assert!(WebhookEnvelope::from_path("/webhooks", "/webhooks/topic/", json!({})).is_none());
        assert!(
            WebhookEnvelope::from_path("/webhooks", "/webhooks/topic/a/b/", json!({})).is_none()
        );

        let unknown =
            WebhookEnvelope::from_path("/webhooks", "/webhooks/topic/forward/", json!({}))
                .expect("route");
        assert_eq!(unknown.known_topic(), None);
    }

    #[test]
    fn classifies_by_topic_then_state() {
        let envelope = json!({"type": "connections", "body": connection_body()});
        let event = WebhookEvent::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(event.topic(), Topic::Connections);
        assert_eq!(event.state(), Some(ConnectionState::RequestReceived.as_str()));
        assert_eq!(serde_json::to_value(&event).expect("serialize"), envelope);
    }

    #[test]
    fn same_body_under_another_topic_is_a_shape_fault() {
        let envelope = WebhookEnvelope::from_topic(Topic::PresentProof, connection_body());
        let err = envelope.classify().expect_err("shape");
        assert!(matches!(
            err,
            ClassifyError::Shape {
                tag: "request_received",
                ..
            }
        ));
    }

    #[test]
    fn unknown_topic_and_unknown_state_are_unrecognized() {
        let topic = WebhookEvent::classify(&json!({"type": "forward", "body": {}}))
            .expect("classify");
        assert!(matches!(
            topic,
            Classification::Unrecognized(Unrecognized { family: "webhook", .. })
        ));

        let mut body = connection_body();
        body["state"] = json!("completed");
        let state = WebhookEnvelope::from_topic(Topic::Connections, body)
            .classify()
            .expect("classify");
        assert!(matches!(
            state,
            Classification::Unrecognized(Unrecognized { family: "connection", .. })
        ));
    }

    #[test]
    fn missing_body_faults() {
        let err = WebhookEvent::classify(&json!({"type": "ping"})).expect_err("body");
        assert!(matches!(err, ClassifyError::MissingField { field: "body", .. }));
    }

    #[test]
    fn problem_reports_have_no_state() {
        let envelope = json!({
            "type": "problem_report",
            "body": {
                "@type": "https://didcomm.org/notification/1.0/problem-report",
                "@id": "pr-1",
                "~thread": {"thid": "th-1"},
                "description": {"en": "no such connection", "code": "invalid_connection"}
            }
        });
        let event = WebhookEvent::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(event.state(), None);
        let WebhookEvent::ProblemReport(report) = event else {
            panic!("expected a problem report");
        };
        assert_eq!(report.code(), Some("invalid_connection"));
        assert_eq!(report.thread_id(), Some("th-1"));
    }
}
