//! Routes agent webhook posts to a [`WebhookHandler`].

use controller_config::ControllerConfig;
use controller_events::{
    Classification, EventStates, HandlerError, Transition, WebhookEnvelope, WebhookHandler,
    dispatch_outcome,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors raised while routing a webhook post.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path is not a topic route under the configured prefix.
    #[error("no webhook route for `{0}`")]
    NotFound(String),
    /// Classification or the handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Result alias for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// What happened to a routed post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The event reached its topic handler.
    Handled {
        /// State transition, when state tracking is enabled.
        transition: Option<Transition>,
    },
    /// The topic or state was unknown and the policy let it through.
    Unrecognized,
}

/// Applies a [`ControllerConfig`] to incoming webhook posts.
///
/// The router owns the optional [`EventStates`], so routing takes
/// `&mut self`. Share it between tasks behind a mutex.
#[derive(Debug)]
pub struct WebhookRouter<H> {
    handler: H,
    config: ControllerConfig,
    states: Option<EventStates>,
}

impl<H: WebhookHandler> WebhookRouter<H> {
    /// Creates a router. State tracking follows
    /// [`ControllerConfig::track_state`].
    #[must_use]
    pub fn new(handler: H, config: ControllerConfig) -> Self {
        let states = config.track_state().then(EventStates::new);
        Self {
            handler,
            config,
            states,
        }
    }

    /// The wrapped handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Tracked record states, when tracking is enabled.
    #[must_use]
    pub fn states(&self) -> Option<&EventStates> {
        self.states.as_ref()
    }

    /// Routes a post received at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] when `path` is not a topic route under
    /// the configured prefix, and otherwise see [`WebhookRouter::route_envelope`].
    pub async fn route(&mut self, path: &str, body: Value) -> RouteResult<Routed> {
        let envelope = WebhookEnvelope::from_path(self.config.webhook_prefix(), path, body)
            .ok_or_else(|| RouteError::NotFound(path.to_owned()))?;
        self.route_envelope(&envelope).await
    }

    /// Classifies `envelope`, dispatches it and then records its state.
    ///
    /// The state is recorded only when the handler succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Handler`] for malformed envelopes, for unknown
    /// events under the reject policy, and for handler failures.
    pub async fn route_envelope(&mut self, envelope: &WebhookEnvelope) -> RouteResult<Routed> {
        let outcome = envelope.classify().map_err(HandlerError::from)?;
        let tracked = match &outcome {
            Classification::Matched(event) if self.states.is_some() => Some(event.clone()),
            _ => None,
        };
        let recognized = outcome.is_match();

        dispatch_outcome(&self.handler, outcome, self.config.unrecognized()).await?;

        let routed = if recognized {
            Routed::Handled {
                transition: self
                    .states
                    .as_mut()
                    .zip(tracked.as_ref())
                    .and_then(|(states, event)| states.observe(event)),
            }
        } else {
            Routed::Unrecognized
        };
        debug!(topic = %envelope.topic, routed = ?routed, "webhook routed");
        Ok(routed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use controller_events::{ConnectionRecord, ConnectionState, EventContext, HandlerResult};
    use serde_json::json;

    use super::*;

    struct Accepting;

    #[derive(Default)]
    struct FailsOnce {
        failed: AtomicBool,
    }

    #[async_trait]
    impl WebhookHandler for FailsOnce {
        async fn handle_connection(
            &self,
            _ctx: EventContext,
            record: ConnectionRecord,
        ) -> HandlerResult {
            if record.is_active() && !self.failed.swap(true, Ordering::SeqCst) {
                return Err(HandlerError::custom("store unavailable"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl WebhookHandler for Accepting {
        async fn handle_connection(
            &self,
            _ctx: EventContext,
            _record: ConnectionRecord,
        ) -> HandlerResult {
            Ok(())
        }
    }

    fn connection(state: &str) -> Value {
        json!({
            "connection_id": "abc",
            "state": state,
            "initiator": "external",
            "routing_state": "none",
            "accept": "manual",
            "invitation_mode": "once",
            "my_did": "WgWxqztrNooG92RXvxSTWv",
            "their_did": "Th7MpTaRZVRYnPiabds81Y"
        })
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let mut router = WebhookRouter::new(Accepting, ControllerConfig::default());
        let err = router
            .route("/hooks/topic/connections/", connection("request_received"))
            .await
            .expect_err("wrong prefix");
        assert!(matches!(err, RouteError::NotFound(ref path) if path.starts_with("/hooks")));
    }

    #[tokio::test]
    async fn tracking_is_off_by_default() {
        let mut router = WebhookRouter::new(Accepting, ControllerConfig::default());
        let routed = router
            .route("/webhooks/topic/connections/", connection("request_received"))
            .await
            .expect("routed");
        assert_eq!(routed, Routed::Handled { transition: None });
        assert!(router.states().is_none());
    }

    #[tokio::test]
    async fn failed_delivery_leaves_state_unrecorded() {
        let config = ControllerConfig::default().with_state_tracking(true);
        let mut router = WebhookRouter::new(FailsOnce::default(), config);
        let path = "/webhooks/topic/connections/";

        router
            .route(path, connection("request_received"))
            .await
            .expect("request routed");
        let err = router
            .route(path, connection("active"))
            .await
            .expect_err("handler fails");
        assert!(matches!(err, RouteError::Handler(HandlerError::Custom(_))));

        let connections = router.states().expect("tracking enabled").connections();
        assert_eq!(
            connections.last("abc").map(|observed| observed.tag),
            Some(ConnectionState::RequestReceived)
        );

        let retried = router
            .route(path, connection("active"))
            .await
            .expect("retry routed");
        let Routed::Handled {
            transition: Some(transition),
        } = retried
        else {
            panic!("unexpected outcome {retried:?}");
        };
        assert!(transition.changed);
        assert_eq!(transition.previous, Some("request_received"));
        assert_eq!(transition.current, "active");
    }
}
