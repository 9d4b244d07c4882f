//! Registry of every wire tag that is multiplexed over a shared transport.
//!
//! Webhook topics share the agent's `POST <webhook_url>/topic/<topic>/` route, and
//! command and query tags share the controller's outbound message channel. Both
//! sets are declared here, once, so that no two families can claim the same tag.

use crate::discriminant;

/// Webhook topic names, as they appear in the agent's callback path.
pub mod topic {
    /// Connection record updates.
    pub const CONNECTIONS: &str = "connections";
    /// Presentation exchange (present-proof v1) record updates.
    pub const PRESENT_PROOF: &str = "present_proof";
    /// Credential exchange (issue-credential v1) record updates.
    pub const ISSUE_CREDENTIAL: &str = "issue_credential";
    /// Inbound basic messages.
    pub const BASIC_MESSAGES: &str = "basicmessages";
    /// Issuer-side credential revocation record updates.
    pub const ISSUER_CRED_REV: &str = "issuer_cred_rev";
    /// Revocation registry record updates.
    pub const REVOCATION_REGISTRY: &str = "revocation_registry";
    /// Mediation record updates.
    pub const MEDIATION: &str = "mediation";
    /// Endorsement transaction record updates.
    pub const ENDORSE_TRANSACTION: &str = "endorse_transaction";
    /// Out-of-band record updates.
    pub const OUT_OF_BAND: &str = "out_of_band";
    /// Trust ping notifications.
    pub const PING: &str = "ping";
    /// Problem reports received from a peer.
    pub const PROBLEM_REPORT: &str = "problem_report";

    /// Every topic, in declaration order.
    pub const ALL: &[&str] = &[
        CONNECTIONS,
        PRESENT_PROOF,
        ISSUE_CREDENTIAL,
        BASIC_MESSAGES,
        ISSUER_CRED_REV,
        REVOCATION_REGISTRY,
        MEDIATION,
        ENDORSE_TRANSACTION,
        OUT_OF_BAND,
        PING,
        PROBLEM_REPORT,
    ];
}

/// Outbound message type tags, shared by the command and query families.
pub mod message_type {
    /// Publish a schema to the ledger.
    pub const CREATE_SCHEMA: &str = "CREATE_SCHEMA";
    /// Publish a credential definition to the ledger.
    pub const CREATE_CREDENTIAL_DEFINITION: &str = "CREATE_CREDENTIAL_DEFINITION";
    /// Create a connection invitation.
    pub const CREATE_INVITATION: &str = "CREATE_INVITATION";
    /// Receive an invitation created by a peer.
    pub const RECEIVE_INVITATION: &str = "RECEIVE_INVITATION";
    /// Accept a received invitation.
    pub const ACCEPT_INVITATION: &str = "ACCEPT_INVITATION";
    /// Accept a received connection request.
    pub const ACCEPT_REQUEST: &str = "ACCEPT_REQUEST";
    /// Send a basic message over a connection.
    pub const SEND_BASIC_MESSAGE: &str = "SEND_BASIC_MESSAGE";
    /// Send a trust ping over a connection.
    pub const SEND_PING: &str = "SEND_PING";
    /// Offer a credential to a holder.
    pub const SEND_CREDENTIAL_OFFER: &str = "SEND_CREDENTIAL_OFFER";
    /// Issue a credential in answer to a request.
    pub const ISSUE_CREDENTIAL: &str = "ISSUE_CREDENTIAL";
    /// Store a received credential in the wallet.
    pub const STORE_CREDENTIAL: &str = "STORE_CREDENTIAL";
    /// Request a presentation from a prover.
    pub const SEND_PRESENTATION_REQUEST: &str = "SEND_PRESENTATION_REQUEST";
    /// Answer a presentation request.
    pub const SEND_PRESENTATION: &str = "SEND_PRESENTATION";
    /// Verify a received presentation.
    pub const VERIFY_PRESENTATION: &str = "VERIFY_PRESENTATION";
    /// Revoke an issued credential.
    pub const REVOKE_CREDENTIAL: &str = "REVOKE_CREDENTIAL";
    /// Remove a connection record.
    pub const REMOVE_CONNECTION: &str = "REMOVE_CONNECTION";

    /// Fetch the agent status.
    pub const GET_STATUS: &str = "GET_STATUS";
    /// List connection records.
    pub const GET_CONNECTIONS: &str = "GET_CONNECTIONS";
    /// Fetch one connection record.
    pub const GET_CONNECTION: &str = "GET_CONNECTION";
    /// Fetch a schema from the ledger.
    pub const GET_SCHEMA: &str = "GET_SCHEMA";
    /// Fetch a credential definition from the ledger.
    pub const GET_CREDENTIAL_DEFINITION: &str = "GET_CREDENTIAL_DEFINITION";
    /// List credentials held in the wallet.
    pub const GET_CREDENTIALS: &str = "GET_CREDENTIALS";
    /// List credential exchange records.
    pub const GET_CREDENTIAL_EXCHANGE_RECORDS: &str = "GET_CREDENTIAL_EXCHANGE_RECORDS";
    /// List presentation exchange records.
    pub const GET_PRESENTATION_EXCHANGE_RECORDS: &str = "GET_PRESENTATION_EXCHANGE_RECORDS";

    /// Every message type, in declaration order.
    pub const ALL: &[&str] = &[
        CREATE_SCHEMA,
        CREATE_CREDENTIAL_DEFINITION,
        CREATE_INVITATION,
        RECEIVE_INVITATION,
        ACCEPT_INVITATION,
        ACCEPT_REQUEST,
        SEND_BASIC_MESSAGE,
        SEND_PING,
        SEND_CREDENTIAL_OFFER,
        ISSUE_CREDENTIAL,
        STORE_CREDENTIAL,
        SEND_PRESENTATION_REQUEST,
        SEND_PRESENTATION,
        VERIFY_PRESENTATION,
        REVOKE_CREDENTIAL,
        REMOVE_CONNECTION,
        GET_STATUS,
        GET_CONNECTIONS,
        GET_CONNECTION,
        GET_SCHEMA,
        GET_CREDENTIAL_DEFINITION,
        GET_CREDENTIALS,
        GET_CREDENTIAL_EXCHANGE_RECORDS,
        GET_PRESENTATION_EXCHANGE_RECORDS,
    ];
}

discriminant! {
    /// Webhook topic, the first-level discriminant of a webhook envelope.
    pub enum Topic {
        /// See [`topic::CONNECTIONS`].
        Connections => topic::CONNECTIONS,
        /// See [`topic::PRESENT_PROOF`].
        PresentProof => topic::PRESENT_PROOF,
        /// See [`topic::ISSUE_CREDENTIAL`].
        IssueCredential => topic::ISSUE_CREDENTIAL,
        /// See [`topic::BASIC_MESSAGES`].
        BasicMessages => topic::BASIC_MESSAGES,
        /// See [`topic::ISSUER_CRED_REV`].
        IssuerCredRev => topic::ISSUER_CRED_REV,
        /// See [`topic::REVOCATION_REGISTRY`].
        RevocationRegistry => topic::REVOCATION_REGISTRY,
        /// See [`topic::MEDIATION`].
        Mediation => topic::MEDIATION,
        /// See [`topic::ENDORSE_TRANSACTION`].
        EndorseTransaction => topic::ENDORSE_TRANSACTION,
        /// See [`topic::OUT_OF_BAND`].
        OutOfBand => topic::OUT_OF_BAND,
        /// See [`topic::PING`].
        Ping => topic::PING,
        /// See [`topic::PROBLEM_REPORT`].
        ProblemReport => topic::PROBLEM_REPORT,
    }
}
