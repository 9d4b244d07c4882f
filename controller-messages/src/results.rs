//! Names for the agent's response payloads.
//!
//! These are read as the agent sends them. Record listings reuse the webhook
//! record families, so a listing containing an unknown state fails to
//! deserialize instead of being silently widened.

use std::collections::BTreeMap;

use controller_events::{ConnectionRecord, CredentialExchangeRecord, PresentationExchangeRecord};
use controller_primitives::{ConnectionId, CredentialDefinitionId, RevocationRegistryId, SchemaId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of `CREATE_SCHEMA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSendResult {
    /// Identifier of the published schema.
    pub schema_id: SchemaId,
    /// The schema as written to the ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Result of `CREATE_CREDENTIAL_DEFINITION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionSendResult {
    /// Identifier of the published definition.
    pub credential_definition_id: CredentialDefinitionId,
}

/// Result of `CREATE_INVITATION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationResult {
    /// Connection created for the invitation.
    pub connection_id: ConnectionId,
    /// The invitation message.
    pub invitation: Value,
    /// The invitation encoded as a URL.
    pub invitation_url: String,
}

/// A `{ results: [...] }` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    /// Listed items.
    pub results: Vec<T>,
}

impl<T> Listing<T> {
    /// Number of listed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` when nothing was listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Result of `GET_CONNECTIONS`.
pub type ConnectionList = Listing<ConnectionRecord>;

/// Result of `GET_CREDENTIAL_EXCHANGE_RECORDS`.
pub type CredentialExchangeList = Listing<CredentialExchangeRecord>;

/// Result of `GET_PRESENTATION_EXCHANGE_RECORDS`.
pub type PresentationExchangeList = Listing<PresentationExchangeRecord>;

/// Result of `GET_STATUS`. The agent reports free-form status fields.
pub type Status = Map<String, Value>;

/// A credential stored in the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredential {
    /// Wallet identifier of the credential.
    pub referent: String,
    /// Attribute values.
    pub attrs: BTreeMap<String, String>,
    /// Schema of the credential.
    pub schema_id: SchemaId,
    /// Definition of the credential.
    pub cred_def_id: CredentialDefinitionId,
    /// Revocation registry, for revocable credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryId>,
    /// Index in the revocation registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_rev_id: Option<String>,
}

/// Result of `GET_CREDENTIALS`.
pub type WalletCredentialList = Listing<WalletCredential>;
