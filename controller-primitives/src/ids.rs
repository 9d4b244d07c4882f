//! Identifier types carried by agent records.
//!
//! The agent mints every identifier itself, so these wrappers only guard against
//! empty values when a controller constructs one by hand. Deserialization is
//! transparent and accepts whatever string the agent sent.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier after checking that it is not blank.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidId`] when the value is empty or whitespace.
            pub fn new(id: impl Into<String>) -> Result<Self> {
                let id = id.into();
                validate(&id, $kind)?;
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

fn validate(id: &str, kind: &'static str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidId {
            kind,
            id: id.into(),
            reason: "identifier cannot be empty",
        });
    }

    if id.chars().any(char::is_control) {
        return Err(Error::InvalidId {
            kind,
            id: id.into(),
            reason: "identifier must not contain control characters",
        });
    }

    Ok(())
}

string_id!(
    /// Identifier of a pairwise connection record.
    ConnectionId,
    "connection id"
);

string_id!(
    /// DIDComm thread identifier shared by every message of one protocol run.
    ThreadId,
    "thread id"
);

string_id!(
    /// Identifier of a presentation exchange record.
    PresentationExchangeId,
    "presentation exchange id"
);

string_id!(
    /// Identifier of a credential exchange record.
    CredentialExchangeId,
    "credential exchange id"
);

string_id!(
    /// Decentralized identifier, public or pairwise.
    Did,
    "did"
);

string_id!(
    /// Ledger identifier of a credential schema.
    SchemaId,
    "schema id"
);

string_id!(
    /// Ledger identifier of a credential definition.
    CredentialDefinitionId,
    "credential definition id"
);

string_id!(
    /// Ledger identifier of a revocation registry.
    RevocationRegistryId,
    "revocation registry id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_ids() {
        let err = ConnectionId::new("  ").expect_err("blank id");
        assert!(matches!(
            err,
            Error::InvalidId {
                kind: "connection id",
                ..
            }
        ));
        assert!(Did::new("did:sov:\u{7}").is_err());
    }

    #[test]
    fn parses_and_displays() {
        let id: ThreadId = "4f2c1e0a".parse().expect("parse");
        assert_eq!(id.to_string(), "4f2c1e0a");
        assert_eq!(String::from(id), "4f2c1e0a");
    }

    #[test]
    fn serializes_transparently() {
        let id = SchemaId::new("WgWxqztrNooG92RXvxSTWv:2:prefs:1.0").expect("schema id");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"WgWxqztrNooG92RXvxSTWv:2:prefs:1.0\"");
        let back: SchemaId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
