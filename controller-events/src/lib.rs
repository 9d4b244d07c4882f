//! Typed webhook events posted by an Aries cloud agent.
//!
//! Each webhook topic carries one record family: a closed set of `state` tags
//! and one typed variant per tag. This crate narrows untyped JSON envelopes to
//! those variants, routes them to async handlers, and optionally tracks record
//! state over time.

#![warn(missing_docs, clippy::pedantic)]

pub mod basic_message;
mod classify;
pub mod common;
pub mod connection;
pub mod credential;
pub mod endorsement;
mod handlers;
pub mod mediation;
pub mod out_of_band;
pub mod ping;
pub mod presentation;
pub mod problem_report;
pub mod revocation;
mod tracker;
mod webhook;

pub use basic_message::{BasicMessageRecord, BasicMessageState};
pub use classify::{
    Classification, ClassifyError, ClassifyResult, RecordFamily, STATE, TYPE, Tracked,
    Unrecognized, classify, classify_tag, deserialize_family, discriminant_of, optional_field,
    serialize_tagged, variant, variant_field,
};
pub use connection::{ConnectionRecord, ConnectionState};
pub use credential::{CredentialExchangeRecord, CredentialExchangeState};
pub use endorsement::{TransactionRecord, TransactionState};
pub use handlers::{
    EventContext, HandlerError, HandlerResult, UnrecognizedPolicy, WebhookHandler,
    dispatch_classified, dispatch_event, dispatch_outcome,
};
pub use mediation::{MediationRecord, MediationState};
pub use out_of_band::{OobRecord, OobState};
pub use ping::{PingRecord, PingState};
pub use presentation::{PresentationExchangeRecord, PresentationExchangeState};
pub use problem_report::ProblemReport;
pub use revocation::{
    IssuerCredRevRecord, IssuerCredRevState, RevocationRegistryRecord, RevocationRegistryState,
};
pub use tracker::{EventStates, Observation, Observed, StateTracker, Transition};
pub use webhook::{WebhookEnvelope, WebhookEvent};

#[cfg(test)]
mod tests {
    use controller_primitives::Discriminant;
    use futures::future::join_all;
    use serde_json::{Value, json};

    use super::*;

    fn request_received() -> Value {
        json!({
            "connection_id": "abc",
            "state": "request_received",
            "initiator": "external",
            "routing_state": "none",
            "accept": "manual",
            "invitation_mode": "once"
        })
    }

    fn holds_for_no_tag<F: RecordFamily>(envelope: &Value) -> bool {
        <F::Tag as Discriminant>::ALL
            .iter()
            .all(|tag| !F::is(*tag, envelope))
    }

    #[test]
    fn connection_request_belongs_to_one_family_only() {
        let envelope = request_received();

        assert!(ConnectionRecord::is(
            ConnectionState::RequestReceived,
            &envelope
        ));
        assert!(
            ConnectionState::ALL
                .iter()
                .filter(|tag| **tag != ConnectionState::RequestReceived)
                .all(|tag| !ConnectionRecord::is(*tag, &envelope))
        );

        assert!(holds_for_no_tag::<PresentationExchangeRecord>(&envelope));
        assert!(holds_for_no_tag::<CredentialExchangeRecord>(&envelope));
        assert!(holds_for_no_tag::<TransactionRecord>(&envelope));
        assert!(holds_for_no_tag::<BasicMessageRecord>(&envelope));
        assert!(holds_for_no_tag::<MediationRecord>(&envelope));
        assert!(holds_for_no_tag::<OobRecord>(&envelope));
        assert!(holds_for_no_tag::<PingRecord>(&envelope));
        assert!(holds_for_no_tag::<IssuerCredRevRecord>(&envelope));
        assert!(holds_for_no_tag::<RevocationRegistryRecord>(&envelope));
    }

    fn every_state_is_exclusive<F: RecordFamily>(envelope: impl Fn(&str) -> Value) {
        for state in <F::Tag as Discriminant>::ALL {
            let accepted = envelope(state.as_str());
            let record = F::classify(&accepted)
                .expect("classify")
                .matched()
                .expect("matched");
            assert_eq!(record.tag(), *state, "{}", F::FAMILY);
            for other in <F::Tag as Discriminant>::ALL {
                assert_eq!(
                    F::is(*other, &accepted),
                    other == state,
                    "{}: {state} envelope tested as {other}",
                    F::FAMILY
                );
            }

            let shouted = envelope(&state.as_str().to_uppercase());
            assert!(holds_for_no_tag::<F>(&shouted), "{}: {state}", F::FAMILY);
        }
    }

    fn connection(state: &str) -> Value {
        json!({
            "connection_id": "abc",
            "state": state,
            "initiator": "self",
            "routing_state": "active",
            "accept": "auto",
            "invitation_mode": "once",
            "my_did": "WgWxqztrNooG92RXvxSTWv",
            "their_did": "Th7MpTaRZVRYnPiabds81Y",
            "error_msg": "peer vanished"
        })
    }

    fn presentation(state: &str) -> Value {
        json!({
            "presentation_exchange_id": "pres-1",
            "thread_id": "thread-1",
            "initiator": "self",
            "role": "verifier",
            "state": state,
            "presentation_proposal_dict": {"comment": "proposal"},
            "presentation_request": {"name": "proof", "version": "1.0"},
            "presentation": {"proof": {}},
            "verified": "true",
            "verified_msgs": [],
            "error_msg": "declined"
        })
    }

    fn credential(state: &str) -> Value {
        json!({
            "credential_exchange_id": "cred-ex-1",
            "thread_id": "thread-7",
            "initiator": "self",
            "role": "issuer",
            "state": state,
            "credential_proposal_dict": {"comment": "please"},
            "credential_definition_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
            "revoc_reg_id": "WgWxqztrNooG92RXvxSTWv:4:reg",
            "revocation_id": "12",
            "error_msg": "abandoned by holder"
        })
    }

    fn basic_message(state: &str) -> Value {
        json!({
            "connection_id": "abc",
            "message_id": "msg-1",
            "content": "hello",
            "sent_time": "2024-03-01 10:15:30.123456Z",
            "state": state
        })
    }

    fn ping(state: &str) -> Value {
        json!({"connection_id": "abc", "thread_id": "th-1", "state": state})
    }

    fn issuer_cred_rev(state: &str) -> Value {
        json!({
            "record_id": "r-1",
            "state": state,
            "cred_ex_id": "cred-ex-1",
            "rev_reg_id": "WgWxqztrNooG92RXvxSTWv:4:reg",
            "cred_rev_id": "3"
        })
    }

    fn revocation_registry(state: &str) -> Value {
        json!({
            "record_id": "reg-1",
            "state": state,
            "cred_def_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
            "issuer_did": "WgWxqztrNooG92RXvxSTWv",
            "revoc_reg_id": "WgWxqztrNooG92RXvxSTWv:4:reg",
            "pending_pub": []
        })
    }

    fn mediation(state: &str) -> Value {
        json!({
            "mediation_id": "med-1",
            "connection_id": "abc",
            "role": "client",
            "state": state,
            "routing_keys": ["did:key:z6Mk"],
            "endpoint": "https://mediator.example/"
        })
    }

    fn transaction(state: &str) -> Value {
        json!({
            "transaction_id": "txn-1",
            "connection_id": "abc",
            "state": state,
            "signature_response": [{"signer_goal_code": "aries.transaction.endorse"}]
        })
    }

    fn out_of_band(state: &str) -> Value {
        json!({
            "oob_id": "oob-1",
            "invi_msg_id": "inv-1",
            "role": "sender",
            "state": state
        })
    }

    #[test]
    fn every_family_state_is_exclusive() {
        every_state_is_exclusive::<ConnectionRecord>(connection);
        every_state_is_exclusive::<PresentationExchangeRecord>(presentation);
        every_state_is_exclusive::<CredentialExchangeRecord>(credential);
        every_state_is_exclusive::<BasicMessageRecord>(basic_message);
        every_state_is_exclusive::<PingRecord>(ping);
        every_state_is_exclusive::<IssuerCredRevRecord>(issuer_cred_rev);
        every_state_is_exclusive::<RevocationRegistryRecord>(revocation_registry);
        every_state_is_exclusive::<MediationRecord>(mediation);
        every_state_is_exclusive::<TransactionRecord>(transaction);
        every_state_is_exclusive::<OobRecord>(out_of_band);
    }

    #[test]
    fn foreign_state_strings_fail_every_predicate() {
        let envelope = json!({"connection_id": "abc", "state": "REQUEST_RECEIVED"});
        assert!(holds_for_no_tag::<ConnectionRecord>(&envelope));
        assert!(holds_for_no_tag::<PresentationExchangeRecord>(&envelope));
        assert!(holds_for_no_tag::<TransactionRecord>(&envelope));
    }

    #[tokio::test]
    async fn classification_is_safe_to_run_concurrently() {
        let envelope = std::sync::Arc::new(request_received());
        let tasks = (0..16).map(|_| {
            let envelope = std::sync::Arc::clone(&envelope);
            tokio::spawn(async move {
                ConnectionRecord::classify(&envelope)
                    .map(|classified| classified.tag())
                    .ok()
                    .flatten()
            })
        });

        for outcome in join_all(tasks).await {
            assert_eq!(
                outcome.expect("task"),
                Some(ConnectionState::RequestReceived)
            );
        }
    }
}
