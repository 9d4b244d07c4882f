//! Revocation bookkeeping records (`issuer_cred_rev` and `revocation_registry`
//! topics).

use controller_primitives::{
    CredentialDefinitionId, Did, Discriminant, RevocationRegistryId, Timestamp, discriminant,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::classify::{
    RecordFamily, STATE, Tracked, deserialize_family, serialize_tagged, variant,
};

discriminant! {
    /// Lifecycle of an issued, revocable credential on the issuer side.
    pub enum IssuerCredRevState {
        /// Credential issued into a revocation registry.
        Issued => "issued",
        /// Credential revoked.
        Revoked => "revoked",
    }
}

/// Issuer-side link between a credential exchange and its revocation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerCredRev {
    /// Record identifier.
    pub record_id: String,
    /// Credential exchange that issued the credential.
    pub cred_ex_id: String,
    /// Revocation registry of the credential.
    pub rev_reg_id: RevocationRegistryId,
    /// Index of the credential in the registry.
    pub cred_rev_id: String,
    /// Definition of the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<CredentialDefinitionId>,
    /// Protocol version of the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_ex_version: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Issuer credential revocation record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuerCredRevRecord {
    /// `issued`
    Issued(IssuerCredRev),
    /// `revoked`
    Revoked(IssuerCredRev),
}

impl IssuerCredRevRecord {
    /// The record body.
    #[must_use]
    pub fn record(&self) -> &IssuerCredRev {
        match self {
            Self::Issued(record) | Self::Revoked(record) => record,
        }
    }
}

impl RecordFamily for IssuerCredRevRecord {
    const FAMILY: &'static str = "issuer credential revocation";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = IssuerCredRevState;

    fn tag(&self) -> IssuerCredRevState {
        match self {
            Self::Issued(_) => IssuerCredRevState::Issued,
            Self::Revoked(_) => IssuerCredRevState::Revoked,
        }
    }

    fn narrow(tag: IssuerCredRevState, envelope: &Value) -> serde_json::Result<Self> {
        Ok(match tag {
            IssuerCredRevState::Issued => Self::Issued(variant(envelope)?),
            IssuerCredRevState::Revoked => Self::Revoked(variant(envelope)?),
        })
    }
}

impl Tracked for IssuerCredRevRecord {
    const TERMINAL: &'static [IssuerCredRevState] = &[IssuerCredRevState::Revoked];

    fn record_id(&self) -> &str {
        &self.record().record_id
    }
}

impl Serialize for IssuerCredRevRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, STATE, self.tag().as_str(), self.record())
    }
}

impl<'de> Deserialize<'de> for IssuerCredRevRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

discriminant! {
    /// Lifecycle of an issuer's revocation registry.
    pub enum RevocationRegistryState {
        /// Record created, registry not generated yet.
        Init => "init",
        /// Registry and tails file generated locally.
        Generated => "generated",
        /// Registry definition published to the ledger.
        Posted => "posted",
        /// Registry accepting new credentials.
        Active => "active",
        /// Every index is used.
        Full => "full",
        /// Registry retired.
        Decommissioned => "decommissioned",
    }
}

/// Fields common to every revocation registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryBase {
    /// Record identifier.
    pub record_id: String,
    /// Definition the registry serves.
    pub cred_def_id: CredentialDefinitionId,
    /// DID of the issuer.
    pub issuer_did: Did,
    /// Registry type, normally `CL_ACCUM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoc_def_type: Option<String>,
    /// Capacity of the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cred_num: Option<u32>,
    /// Registry tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Last error reported for the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Registry that has been generated and therefore has an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRegistry {
    /// Shared fields.
    #[serde(flatten)]
    pub base: RevocationRegistryBase,
    /// Ledger identifier of the registry.
    pub revoc_reg_id: RevocationRegistryId,
    /// Hash of the tails file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tails_hash: Option<String>,
    /// Local path of the tails file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tails_local_path: Option<String>,
    /// Public location of the tails file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tails_public_uri: Option<String>,
    /// Credential revocation indexes awaiting publication.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_pub: Vec<String>,
}

/// Revocation registry record narrowed by its `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationRegistryRecord {
    /// `init`
    Init(RevocationRegistryBase),
    /// `generated`
    Generated(GeneratedRegistry),
    /// `posted`
    Posted(GeneratedRegistry),
    /// `active`
    Active(GeneratedRegistry),
    /// `full`
    Full(GeneratedRegistry),
    /// `decommissioned`
    Decommissioned(GeneratedRegistry),
}

impl RevocationRegistryRecord {
    /// Fields shared by every state.
    #[must_use]
    pub fn base(&self) -> &RevocationRegistryBase {
        match self {
            Self::Init(base) => base,
            Self::Generated(GeneratedRegistry { base, .. })
            | Self::Posted(GeneratedRegistry { base, .. })
            | Self::Active(GeneratedRegistry { base, .. })
            | Self::Full(GeneratedRegistry { base, .. })
            | Self::Decommissioned(GeneratedRegistry { base, .. }) => base,
        }
    }

    /// Ledger identifier, once generated.
    #[must_use]
    pub fn revoc_reg_id(&self) -> Option<&RevocationRegistryId> {
        match self {
            Self::Init(_) => None,
            Self::Generated(registry)
            | Self::Posted(registry)
            | Self::Active(registry)
            | Self::Full(registry)
            | Self::Decommissioned(registry) => Some(&registry.revoc_reg_id),
        }
    }
}

impl RecordFamily for RevocationRegistryRecord {
    const FAMILY: &'static str = "revocation registry";
    const DISCRIMINANT: &'static str = STATE;
    type Tag = RevocationRegistryState;

    fn tag(&self) -> RevocationRegistryState {
        match self {
            Self::Init(_) => RevocationRegistryState::Init,
            Self::Generated(_) => RevocationRegistryState::Generated,
            Self::Posted(_) => RevocationRegistryState::Posted,
            Self::Active(_) => RevocationRegistryState::Active,
            Self::Full(_) => RevocationRegistryState::Full,
            Self::Decommissioned(_) => RevocationRegistryState::Decommissioned,
        }
    }

    fn narrow(tag: RevocationRegistryState, envelope: &Value) -> serde_json::Result<Self> {
        use RevocationRegistryState as S;

        Ok(match tag {
            S::Init => Self::Init(variant(envelope)?),
            S::Generated => Self::Generated(variant(envelope)?),
            S::Posted => Self::Posted(variant(envelope)?),
            S::Active => Self::Active(variant(envelope)?),
            S::Full => Self::Full(variant(envelope)?),
            S::Decommissioned => Self::Decommissioned(variant(envelope)?),
        })
    }
}

impl Tracked for RevocationRegistryRecord {
    const TERMINAL: &'static [RevocationRegistryState] = &[RevocationRegistryState::Decommissioned];

    fn record_id(&self) -> &str {
        &self.base().record_id
    }
}

impl Serialize for RevocationRegistryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag().as_str();
        match self {
            Self::Init(base) => serialize_tagged(serializer, STATE, tag, base),
            Self::Generated(registry)
            | Self::Posted(registry)
            | Self::Active(registry)
            | Self::Full(registry)
            | Self::Decommissioned(registry) => {
                serialize_tagged(serializer, STATE, tag, registry)
            }
        }
    }
}

impl<'de> Deserialize<'de> for RevocationRegistryRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_family(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::classify::ClassifyError;

    #[test]
    fn issuer_cred_rev_states() {
        let mut envelope = json!({
            "record_id": "r-1",
            "state": "issued",
            "cred_ex_id": "cred-ex-1",
            "rev_reg_id": "WgWxqztrNooG92RXvxSTWv:4:reg",
            "cred_rev_id": "3"
        });
        let issued = IssuerCredRevRecord::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(issued.tag(), IssuerCredRevState::Issued);

        envelope["state"] = json!("revoked");
        assert!(IssuerCredRevRecord::is(IssuerCredRevState::Revoked, &envelope));
        assert!(!IssuerCredRevRecord::is(IssuerCredRevState::Issued, &envelope));
    }

    #[test]
    fn init_registry_has_no_id_yet() {
        let envelope = json!({
            "record_id": "reg-1",
            "state": "init",
            "cred_def_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
            "issuer_did": "WgWxqztrNooG92RXvxSTWv",
            "max_cred_num": 100
        });
        let record = RevocationRegistryRecord::classify(&envelope)
            .expect("classify")
            .matched()
            .expect("matched");
        assert_eq!(record.revoc_reg_id(), None);
        assert_eq!(record.base().max_cred_num, Some(100));
        assert_eq!(record.record_id(), "reg-1");
    }

    #[test]
    fn active_registry_requires_id() {
        let envelope = json!({
            "record_id": "reg-1",
            "state": "active",
            "cred_def_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
            "issuer_did": "WgWxqztrNooG92RXvxSTWv"
        });
        let err = RevocationRegistryRecord::classify(&envelope).expect_err("shape");
        assert!(matches!(err, ClassifyError::Shape { tag: "active", .. }));
    }
}
