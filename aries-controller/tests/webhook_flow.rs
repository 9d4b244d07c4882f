use aries_controller::config::ControllerConfig;
use aries_controller::events::{
    BasicMessageRecord, ConnectionRecord, ConnectionState, EventContext, HandlerError,
    HandlerResult, RecordFamily, Tracked, UnrecognizedPolicy, WebhookHandler,
};
use aries_controller::messages::command::{AcceptRequestRequest, SendBasicMessageRequest};
use aries_controller::messages::{Command, CommandType};
use aries_controller::primitives::{ConnectionId, Topic};
use aries_controller::{RouteError, Routed, WebhookRouter};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Accepts connection requests and echoes basic messages back.
#[derive(Default)]
struct Responder {
    outbox: Mutex<Vec<Command>>,
}

impl Responder {
    async fn sent(&self) -> Vec<CommandType> {
        self.outbox
            .lock()
            .await
            .iter()
            .map(Command::message_type)
            .collect()
    }
}

#[async_trait]
impl WebhookHandler for Responder {
    async fn handle_connection(
        &self,
        _ctx: EventContext,
        record: ConnectionRecord,
    ) -> HandlerResult {
        if record.tag() == ConnectionState::RequestReceived {
            let connection_id = ConnectionId::new(record.record_id())
                .map_err(|err| HandlerError::custom(err.to_string()))?;
            self.outbox
                .lock()
                .await
                .push(Command::AcceptRequest(AcceptRequestRequest {
                    connection_id,
                    my_endpoint: None,
                }));
        }
        Ok(())
    }

    async fn handle_basic_message(
        &self,
        _ctx: EventContext,
        record: BasicMessageRecord,
    ) -> HandlerResult {
        let message = record.message();
        self.outbox
            .lock()
            .await
            .push(Command::SendBasicMessage(SendBasicMessageRequest {
                connection_id: message.connection_id.clone(),
                content: format!("echo: {}", message.content),
            }));
        Ok(())
    }
}

fn connection(state: &str) -> Value {
    json!({
        "connection_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        "state": state,
        "initiator": "external",
        "routing_state": "none",
        "accept": "manual",
        "invitation_mode": "once",
        "their_label": "Alice",
        "my_did": "WgWxqztrNooG92RXvxSTWv",
        "their_did": "Th7MpTaRZVRYnPiabds81Y"
    })
}

fn basic_message() -> Value {
    json!({
        "connection_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        "message_id": "m-1",
        "content": "hello",
        "sent_time": "2024-03-01 10:15:30.123456Z",
        "state": "received"
    })
}

fn tracking_config() -> anyhow::Result<ControllerConfig> {
    Ok(ControllerConfig::new()
        .with_webhook_prefix("/agent")?
        .with_state_tracking(true))
}

#[tokio::test]
async fn connection_request_is_answered() -> anyhow::Result<()> {
    let mut router = WebhookRouter::new(Responder::default(), tracking_config()?);

    let routed = router
        .route("/agent/topic/connections/", connection("request_received"))
        .await?;
    let Routed::Handled {
        transition: Some(transition),
    } = routed
    else {
        anyhow::bail!("expected a tracked transition, got {routed:?}");
    };
    assert_eq!(transition.topic, Topic::Connections);
    assert_eq!(transition.previous, None);
    assert_eq!(transition.current, "request_received");

    let message = router
        .route("/agent/topic/basicmessages", basic_message())
        .await?;
    assert_eq!(message, Routed::Handled { transition: None });

    assert_eq!(
        router.handler().sent().await,
        [CommandType::AcceptRequest, CommandType::SendBasicMessage]
    );

    let outbox = router.handler().outbox.lock().await;
    let reply = outbox[1].clone().into_message()?;
    assert_eq!(
        serde_json::to_value(&reply)?,
        json!({
            "type": "SEND_BASIC_MESSAGE",
            "payload": {
                "connection_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "content": "echo: hello"
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn tracker_follows_a_connection() -> anyhow::Result<()> {
    let mut router = WebhookRouter::new(Responder::default(), tracking_config()?);

    for state in ["request_received", "response_sent", "active"] {
        router
            .route("/agent/topic/connections/", connection(state))
            .await?;
    }

    let states = router.states().expect("tracking enabled");
    let last = states
        .connections()
        .last("3fa85f64-5717-4562-b3fc-2c963f66afa6")
        .expect("tracked");
    assert_eq!(last.tag, ConnectionState::Active);

    let again = router
        .route("/agent/topic/connections/", connection("active"))
        .await?;
    assert!(matches!(
        again,
        Routed::Handled { transition: Some(ref t) } if !t.changed && t.previous == Some("active")
    ));

    let closed = router
        .route("/agent/topic/connections/", connection("inactive"))
        .await?;
    assert!(matches!(
        closed,
        Routed::Handled { transition: Some(ref t) } if t.current == "inactive" && t.changed
    ));
    assert!(router.states().expect("tracking enabled").connections().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_events_follow_policy() -> anyhow::Result<()> {
    let mut lenient = WebhookRouter::new(Responder::default(), ControllerConfig::new());
    let routed = lenient
        .route("/webhooks/topic/connections/", connection("completed"))
        .await?;
    assert_eq!(routed, Routed::Unrecognized);
    let routed = lenient.route("/webhooks/topic/forward/", json!({})).await?;
    assert_eq!(routed, Routed::Unrecognized);
    assert!(lenient.handler().sent().await.is_empty());

    let strict_config = ControllerConfig::new().with_unrecognized(UnrecognizedPolicy::Reject);
    let mut strict = WebhookRouter::new(Responder::default(), strict_config);
    let err = strict
        .route("/webhooks/topic/connections/", connection("completed"))
        .await
        .expect_err("rejected");
    assert!(matches!(
        err,
        RouteError::Handler(HandlerError::Unrecognized(ref unrecognized))
            if unrecognized.tag == "completed"
    ));
    Ok(())
}

#[tokio::test]
async fn unhandled_topics_and_bad_routes_are_errors() {
    let mut router = WebhookRouter::new(Responder::default(), ControllerConfig::new());

    let err = router
        .route(
            "/webhooks/topic/ping/",
            json!({"connection_id": "abc", "thread_id": "th-1", "state": "received"}),
        )
        .await
        .expect_err("unsupported");
    assert!(matches!(
        err,
        RouteError::Handler(HandlerError::Unsupported(Topic::Ping))
    ));

    let err = router
        .route("/webhooks/connections", connection("active"))
        .await
        .expect_err("not a topic route");
    assert!(matches!(err, RouteError::NotFound(_)));
}
