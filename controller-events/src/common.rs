//! Field types shared by several record families.

use serde::{Deserialize, Serialize};

/// Which party started a protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiator {
    /// This agent started it.
    #[serde(rename = "self")]
    Local,
    /// The peer started it.
    External,
    /// Started from a multi-use invitation.
    Multiuse,
}

/// Role of this agent in a present-proof exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationRole {
    /// This agent presents.
    Prover,
    /// This agent verifies.
    Verifier,
}

/// Role of this agent in an issue-credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialRole {
    /// This agent issues.
    Issuer,
    /// This agent holds.
    Holder,
}

/// DIDComm `~thread` decorator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDecorator {
    /// Thread identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thid: Option<String>,
    /// Parent thread identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pthid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiator_uses_agent_spelling() {
        assert_eq!(
            serde_json::to_string(&Initiator::Local).expect("serialize"),
            "\"self\""
        );
        let external: Initiator = serde_json::from_str("\"external\"").expect("external");
        assert_eq!(external, Initiator::External);
    }
}
