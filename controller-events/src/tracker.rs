//! Opt-in observer of record state transitions.
//!
//! Classification never looks at history: any state may follow any other.
//! [`StateTracker`] remembers the last tag seen per record so a controller can
//! see what changed, without ever refusing a transition. Records that reach
//! one of their family's [`Tracked::TERMINAL`] states are dropped.

use std::collections::HashMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use controller_primitives::{Discriminant, Topic};
use tracing::debug;

use crate::classify::{RecordFamily, Tracked};
use crate::connection::ConnectionRecord;
use crate::credential::CredentialExchangeRecord;
use crate::endorsement::TransactionRecord;
use crate::mediation::MediationRecord;
use crate::out_of_band::OobRecord;
use crate::presentation::PresentationExchangeRecord;
use crate::revocation::{IssuerCredRevRecord, RevocationRegistryRecord};
use crate::webhook::WebhookEvent;

/// Last state observed for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed<T> {
    /// State tag.
    pub tag: T,
    /// When it was observed.
    pub at: DateTime<Utc>,
}

/// Result of observing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation<T> {
    /// Previously observed state, `None` for a record seen for the first time.
    pub previous: Option<T>,
    /// State just observed.
    pub current: T,
    /// `true` unless the state repeats the previous observation.
    pub changed: bool,
}

/// Remembers the last state of every record of family `F`, keyed by record id.
#[derive(Debug)]
pub struct StateTracker<F: Tracked> {
    records: HashMap<String, Observed<F::Tag>>,
    _family: PhantomData<fn() -> F>,
}

impl<F: Tracked> Default for StateTracker<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Tracked> StateTracker<F> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            _family: PhantomData,
        }
    }

    /// Records the state of `record` as of now.
    pub fn observe(&mut self, record: &F) -> Observation<F::Tag> {
        self.observe_at(record, Utc::now())
    }

    /// Records the state of `record` as of `at`. A terminal state is reported
    /// and the record forgotten.
    pub fn observe_at(&mut self, record: &F, at: DateTime<Utc>) -> Observation<F::Tag> {
        let current = record.tag();
        let replaced = if F::TERMINAL.contains(&current) {
            self.records.remove(record.record_id())
        } else {
            self.records
                .insert(record.record_id().to_owned(), Observed { tag: current, at })
        };
        let previous = replaced.map(|observed| observed.tag);
        let changed = previous != Some(current);

        if changed {
            debug!(
                family = F::FAMILY,
                record_id = record.record_id(),
                from = previous.map(|tag| tag.as_str()),
                to = %current,
                "record state transition"
            );
        }

        Observation {
            previous,
            current,
            changed,
        }
    }

    /// Last observation for a record id.
    #[must_use]
    pub fn last(&self, record_id: &str) -> Option<&Observed<F::Tag>> {
        self.records.get(record_id)
    }

    /// Drops a record, returning its last observation.
    pub fn forget(&mut self, record_id: &str) -> Option<Observed<F::Tag>> {
        self.records.remove(record_id)
    }

    /// Number of records that have not reached a terminal state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no record has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A state observation for a record of any webhook family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Topic of the record.
    pub topic: Topic,
    /// Record identifier.
    pub record_id: String,
    /// Previously observed state tag.
    pub previous: Option<&'static str>,
    /// State tag just observed.
    pub current: &'static str,
    /// `true` unless the state repeats the previous observation.
    pub changed: bool,
}

/// One [`StateTracker`] per webhook family with a multi-step lifecycle.
///
/// Basic messages and pings arrive once per record and are not tracked.
#[derive(Debug, Default)]
pub struct EventStates {
    connections: StateTracker<ConnectionRecord>,
    presentations: StateTracker<PresentationExchangeRecord>,
    credentials: StateTracker<CredentialExchangeRecord>,
    issuer_cred_revs: StateTracker<IssuerCredRevRecord>,
    revocation_registries: StateTracker<RevocationRegistryRecord>,
    mediations: StateTracker<MediationRecord>,
    transactions: StateTracker<TransactionRecord>,
    out_of_band: StateTracker<OobRecord>,
}

impl EventStates {
    /// Creates empty trackers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes the record carried by `event`.
    ///
    /// Basic messages, pings and problem reports return `None`.
    pub fn observe(&mut self, event: &WebhookEvent) -> Option<Transition> {
        let topic = event.topic();
        Some(match event {
            WebhookEvent::Connection(record) => transition(topic, &mut self.connections, record),
            WebhookEvent::PresentProof(record) => {
                transition(topic, &mut self.presentations, record)
            }
            WebhookEvent::IssueCredential(record) => {
                transition(topic, &mut self.credentials, record)
            }
            WebhookEvent::IssuerCredRev(record) => {
                transition(topic, &mut self.issuer_cred_revs, record)
            }
            WebhookEvent::RevocationRegistry(record) => {
                transition(topic, &mut self.revocation_registries, record)
            }
            WebhookEvent::Mediation(record) => transition(topic, &mut self.mediations, record),
            WebhookEvent::EndorseTransaction(record) => {
                transition(topic, &mut self.transactions, record)
            }
            WebhookEvent::OutOfBand(record) => transition(topic, &mut self.out_of_band, record),
            WebhookEvent::BasicMessage(_)
            | WebhookEvent::Ping(_)
            | WebhookEvent::ProblemReport(_) => return None,
        })
    }

    /// Connection states seen so far.
    #[must_use]
    pub fn connections(&self) -> &StateTracker<ConnectionRecord> {
        &self.connections
    }

    /// Presentation exchange states seen so far.
    #[must_use]
    pub fn presentations(&self) -> &StateTracker<PresentationExchangeRecord> {
        &self.presentations
    }

    /// Credential exchange states seen so far.
    #[must_use]
    pub fn credentials(&self) -> &StateTracker<CredentialExchangeRecord> {
        &self.credentials
    }

    /// Issuer-side revocable credential states seen so far.
    #[must_use]
    pub fn issuer_cred_revs(&self) -> &StateTracker<IssuerCredRevRecord> {
        &self.issuer_cred_revs
    }

    /// Revocation registry states seen so far.
    #[must_use]
    pub fn revocation_registries(&self) -> &StateTracker<RevocationRegistryRecord> {
        &self.revocation_registries
    }

    /// Mediation states seen so far.
    #[must_use]
    pub fn mediations(&self) -> &StateTracker<MediationRecord> {
        &self.mediations
    }

    /// Endorsed transaction states seen so far.
    #[must_use]
    pub fn transactions(&self) -> &StateTracker<TransactionRecord> {
        &self.transactions
    }

    /// Out-of-band invitation states seen so far.
    #[must_use]
    pub fn out_of_band(&self) -> &StateTracker<OobRecord> {
        &self.out_of_band
    }
}

fn transition<F: Tracked>(topic: Topic, tracker: &mut StateTracker<F>, record: &F) -> Transition {
    let observation = tracker.observe(record);
    Transition {
        topic,
        record_id: record.record_id().to_owned(),
        previous: observation.previous.map(Discriminant::as_str),
        current: observation.current.as_str(),
        changed: observation.changed,
    }
}
