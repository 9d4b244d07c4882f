//! Routing of classified webhook events to controller callbacks.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use controller_primitives::Topic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::basic_message::BasicMessageRecord;
use crate::classify::{Classification, ClassifyError, Unrecognized};
use crate::connection::ConnectionRecord;
use crate::credential::CredentialExchangeRecord;
use crate::endorsement::TransactionRecord;
use crate::mediation::MediationRecord;
use crate::out_of_band::OobRecord;
use crate::ping::PingRecord;
use crate::presentation::PresentationExchangeRecord;
use crate::problem_report::ProblemReport;
use crate::revocation::{IssuerCredRevRecord, RevocationRegistryRecord};
use crate::webhook::{WebhookEnvelope, WebhookEvent};

/// What dispatch does with events whose topic or state is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Hand the event to [`WebhookHandler::handle_unrecognized`].
    #[default]
    Ignore,
    /// Fail dispatch with [`HandlerError::Unrecognized`].
    Reject,
}

impl UnrecognizedPolicy {
    /// Configuration spelling of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        }
    }
}

impl Display for UnrecognizedPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnrecognizedPolicy {
    type Err = HandlerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(HandlerError::custom(format!(
                "unknown unrecognized-event policy `{other}`"
            ))),
        }
    }
}

/// Context provided to event handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    topic: Topic,
    state: Option<&'static str>,
    received_at: DateTime<Utc>,
}

impl EventContext {
    /// Captures the routing facts of an event at the time of dispatch.
    #[must_use]
    pub fn for_event(event: &WebhookEvent) -> Self {
        Self {
            topic: event.topic(),
            state: event.state(),
            received_at: Utc::now(),
        }
    }

    /// Topic the event was posted under.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    /// State tag of the record, absent for problem reports.
    #[must_use]
    pub const fn state(&self) -> Option<&'static str> {
        self.state
    }

    /// When dispatch started.
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Errors that can occur during event handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The envelope was malformed.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    /// The controller does not handle the topic.
    #[error("webhook topic `{0}` is not supported")]
    Unsupported(Topic),
    /// The topic or state is unknown and the policy rejects it.
    #[error("{0}")]
    Unrecognized(Unrecognized),
    /// Custom handler error with human-readable context.
    #[error("handler error: {0}")]
    Custom(String),
}

impl HandlerError {
    /// Creates a custom error variant from a string-like value.
    #[must_use]
    pub fn custom(reason: impl Into<String>) -> Self {
        Self::Custom(reason.into())
    }
}

/// Result alias for handler operations.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;

/// Trait implemented by controllers that react to agent webhooks.
///
/// Every topic defaults to [`WebhookHandler::handle_unhandled`], so an
/// implementation only overrides the topics it cares about.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Called for `connections` events.
    async fn handle_connection(
        &self,
        ctx: EventContext,
        record: ConnectionRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `present_proof` events.
    async fn handle_present_proof(
        &self,
        ctx: EventContext,
        record: PresentationExchangeRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `issue_credential` events.
    async fn handle_issue_credential(
        &self,
        ctx: EventContext,
        record: CredentialExchangeRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `basicmessages` events.
    async fn handle_basic_message(
        &self,
        ctx: EventContext,
        record: BasicMessageRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `issuer_cred_rev` events.
    async fn handle_issuer_cred_rev(
        &self,
        ctx: EventContext,
        record: IssuerCredRevRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `revocation_registry` events.
    async fn handle_revocation_registry(
        &self,
        ctx: EventContext,
        record: RevocationRegistryRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `mediation` events.
    async fn handle_mediation(&self, ctx: EventContext, record: MediationRecord) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `endorse_transaction` events.
    async fn handle_endorse_transaction(
        &self,
        ctx: EventContext,
        record: TransactionRecord,
    ) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `out_of_band` events.
    async fn handle_out_of_band(&self, ctx: EventContext, record: OobRecord) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `ping` events.
    async fn handle_ping(&self, ctx: EventContext, record: PingRecord) -> HandlerResult {
        let _ = record;
        self.handle_unhandled(ctx).await
    }

    /// Called for `problem_report` events.
    async fn handle_problem_report(
        &self,
        ctx: EventContext,
        report: ProblemReport,
    ) -> HandlerResult {
        let _ = report;
        self.handle_unhandled(ctx).await
    }

    /// Fallback invoked when a topic handler is not implemented.
    async fn handle_unhandled(&self, ctx: EventContext) -> HandlerResult {
        Err(HandlerError::Unsupported(ctx.topic()))
    }

    /// Called for unknown topics and states under [`UnrecognizedPolicy::Ignore`].
    async fn handle_unrecognized(&self, unrecognized: Unrecognized) -> HandlerResult {
        warn!(
            family = unrecognized.family,
            discriminant = unrecognized.discriminant,
            tag = %unrecognized.tag,
            "ignoring unrecognized webhook event"
        );
        Ok(())
    }
}

/// Classifies an envelope and dispatches it to the matching handler method.
///
/// # Errors
///
/// Returns [`HandlerError::Classify`] for malformed envelopes,
/// [`HandlerError::Unrecognized`] for unknown events under
/// [`UnrecognizedPolicy::Reject`], and otherwise whatever the handler returns.
pub async fn dispatch_event<H>(
    handler: &H,
    envelope: &WebhookEnvelope,
    policy: UnrecognizedPolicy,
) -> HandlerResult
where
    H: WebhookHandler + ?Sized,
{
    dispatch_outcome(handler, envelope.classify()?, policy).await
}

/// Dispatches the outcome of a classification, applying `policy` to
/// unrecognized events.
///
/// # Errors
///
/// Returns [`HandlerError::Unrecognized`] for unknown events under
/// [`UnrecognizedPolicy::Reject`], and otherwise whatever the handler returns.
pub async fn dispatch_outcome<H>(
    handler: &H,
    outcome: Classification<WebhookEvent>,
    policy: UnrecognizedPolicy,
) -> HandlerResult
where
    H: WebhookHandler + ?Sized,
{
    match outcome {
        Classification::Matched(event) => dispatch_classified(handler, event).await,
        Classification::Unrecognized(unrecognized) => match policy {
            UnrecognizedPolicy::Ignore => handler.handle_unrecognized(unrecognized).await,
            UnrecognizedPolicy::Reject => Err(HandlerError::Unrecognized(unrecognized)),
        },
    }
}

/// Dispatches an already classified event.
///
/// # Errors
///
/// Propagates errors returned by the underlying handler implementation.
pub async fn dispatch_classified<H>(handler: &H, event: WebhookEvent) -> HandlerResult
where
    H: WebhookHandler + ?Sized,
{
    let ctx = EventContext::for_event(&event);
    debug!(topic = %ctx.topic(), state = ctx.state(), "dispatching webhook event");

    match event {
        WebhookEvent::Connection(record) => handler.handle_connection(ctx, record).await,
        WebhookEvent::PresentProof(record) => handler.handle_present_proof(ctx, record).await,
        WebhookEvent::IssueCredential(record) => {
            handler.handle_issue_credential(ctx, record).await
        }
        WebhookEvent::BasicMessage(record) => handler.handle_basic_message(ctx, record).await,
        WebhookEvent::IssuerCredRev(record) => handler.handle_issuer_cred_rev(ctx, record).await,
        WebhookEvent::RevocationRegistry(record) => {
            handler.handle_revocation_registry(ctx, record).await
        }
        WebhookEvent::Mediation(record) => handler.handle_mediation(ctx, record).await,
        WebhookEvent::EndorseTransaction(record) => {
            handler.handle_endorse_transaction(ctx, record).await
        }
        WebhookEvent::OutOfBand(record) => handler.handle_out_of_band(ctx, record).await,
        WebhookEvent::Ping(record) => handler.handle_ping(ctx, record).await,
        WebhookEvent::ProblemReport(report) => handler.handle_problem_report(ctx, report).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::classify::RecordFamily;
    use crate::connection::ConnectionState;

    #[derive(Default)]
    struct ConnectionCounter {
        active: Arc<AtomicUsize>,
        unrecognized: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WebhookHandler for ConnectionCounter {
        async fn handle_connection(
            &self,
            ctx: EventContext,
            record: ConnectionRecord,
        ) -> HandlerResult {
            assert_eq!(ctx.topic(), Topic::Connections);
            if record.tag() == ConnectionState::Active {
                self.active.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        async fn handle_unrecognized(&self, _unrecognized: Unrecognized) -> HandlerResult {
            self.unrecognized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn active_connection() -> WebhookEnvelope {
        WebhookEnvelope::from_topic(
            Topic::Connections,
            json!({
                "connection_id": "abc",
                "state": "active",
                "initiator": "self",
                "routing_state": "none",
                "accept": "auto",
                "invitation_mode": "once",
                "my_did": "WgWxqztrNooG92RXvxSTWv",
                "their_did": "Th7MpTaRZVRYnPiabds81Y"
            }),
        )
    }

    #[tokio::test]
    async fn dispatches_to_topic_handler() {
        let handler = ConnectionCounter::default();
        dispatch_event(&handler, &active_connection(), UnrecognizedPolicy::Ignore)
            .await
            .expect("dispatch");
        assert_eq!(handler.active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unhandled_topic_is_unsupported() {
        let handler = ConnectionCounter::default();
        let envelope = WebhookEnvelope::from_topic(
            Topic::Ping,
            json!({"connection_id": "abc", "thread_id": "th-1", "state": "received"}),
        );
        let err = dispatch_event(&handler, &envelope, UnrecognizedPolicy::Ignore)
            .await
            .expect_err("unsupported");
        assert!(matches!(err, HandlerError::Unsupported(Topic::Ping)));
    }

    #[tokio::test]
    async fn unrecognized_policy_is_honoured() {
        let handler = ConnectionCounter::default();
        let envelope = WebhookEnvelope {
            topic: "forward".into(),
            body: json!({}),
        };

        dispatch_event(&handler, &envelope, UnrecognizedPolicy::Ignore)
            .await
            .expect("ignored");
        assert_eq!(handler.unrecognized.load(Ordering::SeqCst), 1);

        let err = dispatch_event(&handler, &envelope, UnrecognizedPolicy::Reject)
            .await
            .expect_err("rejected");
        assert!(matches!(
            err,
            HandlerError::Unrecognized(Unrecognized { ref tag, .. }) if tag == "forward"
        ));
        assert_eq!(handler.unrecognized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_envelope_is_a_classify_error() {
        let handler = ConnectionCounter::default();
        let envelope = WebhookEnvelope::from_topic(Topic::Connections, json!({"state": 7}));
        let err = dispatch_event(&handler, &envelope, UnrecognizedPolicy::Ignore)
            .await
            .expect_err("malformed");
        assert!(matches!(
            err,
            HandlerError::Classify(ClassifyError::NonStringDiscriminant { .. })
        ));
    }

    #[test]
    fn policy_spelling() {
        assert_eq!(
            "reject".parse::<UnrecognizedPolicy>().ok(),
            Some(UnrecognizedPolicy::Reject)
        );
        assert!("Reject".parse::<UnrecognizedPolicy>().is_err());
        assert_eq!(UnrecognizedPolicy::default().to_string(), "ignore");
    }
}
