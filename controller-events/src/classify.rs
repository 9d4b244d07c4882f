//! Narrowing of untyped envelopes to typed record variants.
//!
//! A record family is a closed set of variants sharing one discriminant field.
//! [`classify`] reads that field from a borrowed JSON envelope, matches it
//! against the family's tags and, on a hit, deserializes the envelope into the
//! variant selected by the tag. The envelope is never mutated or consumed.

use std::fmt::{self, Display, Formatter};

use controller_primitives::Discriminant;
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

/// Discriminant field used by agent records.
pub const STATE: &str = "state";
/// Discriminant field used by message envelopes.
pub const TYPE: &str = "type";

/// A closed family of variants selected by one discriminant field.
pub trait RecordFamily: Sized {
    /// Human-readable family name used in logs and errors.
    const FAMILY: &'static str;
    /// Name of the discriminant field (`state` or `type`).
    const DISCRIMINANT: &'static str;

    /// Tag set of the family.
    type Tag: Discriminant;

    /// Returns the tag of this variant.
    fn tag(&self) -> Self::Tag;

    /// Deserializes the variant selected by `tag` from the envelope.
    ///
    /// # Errors
    ///
    /// Returns the serde error raised when the envelope lacks a field the
    /// selected variant requires.
    fn narrow(tag: Self::Tag, envelope: &Value) -> serde_json::Result<Self>;

    /// Classifies an envelope against this family. See [`classify`].
    ///
    /// # Errors
    ///
    /// See [`classify`].
    fn classify(envelope: &Value) -> ClassifyResult<Classification<Self>> {
        classify(envelope)
    }

    /// Predicate for one variant: `true` iff the envelope carries `tag` and has
    /// the family's shape.
    fn is(tag: Self::Tag, envelope: &Value) -> bool {
        match classify_tag::<Self>(envelope) {
            Ok(Some(found)) if found == tag => Self::narrow(tag, envelope).is_ok(),
            _ => false,
        }
    }
}

/// Families whose variants describe one agent-side record.
pub trait Tracked: RecordFamily {
    /// States after which the agent sends no further webhook for the record.
    /// A [`StateTracker`](crate::StateTracker) drops records that reach one.
    const TERMINAL: &'static [Self::Tag] = &[];

    /// Identifier of the underlying record, stable across state changes.
    fn record_id(&self) -> &str;
}

/// Outcome of a classification that did not fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<F> {
    /// The discriminant selected a variant and the envelope had its shape.
    Matched(F),
    /// The discriminant is not one of the family's tags.
    Unrecognized(Unrecognized),
}

impl<F> Classification<F> {
    /// Returns the narrowed variant, if any.
    #[must_use]
    pub fn matched(self) -> Option<F> {
        match self {
            Self::Matched(record) => Some(record),
            Self::Unrecognized(_) => None,
        }
    }

    /// Borrows the narrowed variant, if any.
    #[must_use]
    pub fn as_matched(&self) -> Option<&F> {
        match self {
            Self::Matched(record) => Some(record),
            Self::Unrecognized(_) => None,
        }
    }

    /// Returns `true` when a variant matched.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// Maps the matched variant, keeping unrecognized outcomes untouched.
    #[must_use]
    pub fn map<G>(self, f: impl FnOnce(F) -> G) -> Classification<G> {
        match self {
            Self::Matched(record) => Classification::Matched(f(record)),
            Self::Unrecognized(unrecognized) => Classification::Unrecognized(unrecognized),
        }
    }
}

impl<F: RecordFamily> Classification<F> {
    /// Tag of the matched variant.
    #[must_use]
    pub fn tag(&self) -> Option<F::Tag> {
        self.as_matched().map(RecordFamily::tag)
    }
}

/// Discriminant value that no variant of a family claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unrecognized {
    /// Family the envelope was classified against.
    pub family: &'static str,
    /// Discriminant field that was read.
    pub discriminant: &'static str,
    /// The unrecognized value.
    pub tag: String,
}

impl Display for Unrecognized {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized {} {} `{}`",
            self.family, self.discriminant, self.tag
        )
    }
}

/// Faults raised for malformed envelopes.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The discriminant field is absent (or the envelope is not an object).
    #[error("{family} envelope is missing the `{field}` discriminant")]
    MissingDiscriminant {
        /// Family the envelope was classified against.
        family: &'static str,
        /// Expected discriminant field.
        field: &'static str,
    },
    /// The discriminant field is present but not a string.
    #[error("{family} discriminant `{field}` must be a string, found {found}")]
    NonStringDiscriminant {
        /// Family the envelope was classified against.
        family: &'static str,
        /// Discriminant field.
        field: &'static str,
        /// JSON kind that was found instead.
        found: &'static str,
    },
    /// A field that carries the envelope body is absent.
    #[error("{family} envelope is missing its `{field}` field")]
    MissingField {
        /// Family the envelope was classified against.
        family: &'static str,
        /// Missing field.
        field: &'static str,
    },
    /// The tag matched but the envelope lacks fields the variant requires.
    #[error("{family} envelope tagged `{tag}` has an unexpected shape: {source}")]
    Shape {
        /// Family the envelope was classified against.
        family: &'static str,
        /// Matched tag.
        tag: &'static str,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Reads a string discriminant from an envelope.
///
/// # Errors
///
/// Returns [`ClassifyError::MissingDiscriminant`] or
/// [`ClassifyError::NonStringDiscriminant`] for malformed envelopes.
pub fn discriminant_of<'a>(
    envelope: &'a Value,
    family: &'static str,
    field: &'static str,
) -> ClassifyResult<&'a str> {
    match envelope.get(field) {
        Some(Value::String(tag)) => Ok(tag),
        Some(other) => Err(ClassifyError::NonStringDiscriminant {
            family,
            field,
            found: json_kind(other),
        }),
        None => Err(ClassifyError::MissingDiscriminant { family, field }),
    }
}

/// Matches an envelope's discriminant against the family's tags without
/// deserializing anything else.
///
/// # Errors
///
/// Propagates malformed-envelope faults from [`discriminant_of`].
pub fn classify_tag<F: RecordFamily>(envelope: &Value) -> ClassifyResult<Option<F::Tag>> {
    let raw = discriminant_of(envelope, F::FAMILY, F::DISCRIMINANT)?;
    Ok(F::Tag::from_tag(raw))
}

/// Classifies an envelope against a record family.
///
/// An unknown discriminant is a normal outcome and yields
/// [`Classification::Unrecognized`]; callers decide whether to log, ignore, or
/// reject it.
///
/// # Errors
///
/// Returns [`ClassifyError`] when the discriminant is missing or not a string,
/// or when the matched variant cannot be read from the envelope.
pub fn classify<F: RecordFamily>(envelope: &Value) -> ClassifyResult<Classification<F>> {
    let raw = discriminant_of(envelope, F::FAMILY, F::DISCRIMINANT)?;
    let Some(tag) = F::Tag::from_tag(raw) else {
        debug!(
            family = F::FAMILY,
            discriminant = F::DISCRIMINANT,
            tag = raw,
            "unrecognized discriminant"
        );
        return Ok(Classification::Unrecognized(Unrecognized {
            family: F::FAMILY,
            discriminant: F::DISCRIMINANT,
            tag: raw.to_owned(),
        }));
    };

    let record = F::narrow(tag, envelope).map_err(|source| ClassifyError::Shape {
        family: F::FAMILY,
        tag: tag.as_str(),
        source,
    })?;
    trace!(family = F::FAMILY, %tag, "envelope classified");
    Ok(Classification::Matched(record))
}

/// Reads a variant body from the whole envelope.
///
/// # Errors
///
/// Returns the serde error for missing or mistyped fields.
pub fn variant<T: DeserializeOwned>(envelope: &Value) -> serde_json::Result<T> {
    T::deserialize(envelope)
}

/// Reads a variant body from a required field of the envelope.
///
/// # Errors
///
/// Returns a `missing field` error when the field is absent, or the serde error
/// for a mistyped body.
pub fn variant_field<T: DeserializeOwned>(
    envelope: &Value,
    field: &'static str,
) -> serde_json::Result<T> {
    match envelope.get(field) {
        Some(body) => T::deserialize(body),
        None => Err(serde_json::Error::missing_field(field)),
    }
}

/// Reads a variant body from an optional field; absent and `null` both read as
/// `None`.
///
/// # Errors
///
/// Returns the serde error for a mistyped body.
pub fn optional_field<T: DeserializeOwned>(
    envelope: &Value,
    field: &'static str,
) -> serde_json::Result<Option<T>> {
    match envelope.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(body) => T::deserialize(body).map(Some),
    }
}

/// Serializes a variant body with its discriminant inserted as a sibling field.
///
/// # Errors
///
/// Fails when the body does not serialize to a JSON object.
pub fn serialize_tagged<S, T>(
    serializer: S,
    field: &'static str,
    tag: &'static str,
    body: &T,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut fields = match serde_json::to_value(body).map_err(S::Error::custom)? {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        other => {
            return Err(S::Error::custom(format_args!(
                "cannot tag {} as a record body",
                json_kind(&other)
            )));
        }
    };
    fields.insert(field.to_owned(), Value::String(tag.to_owned()));
    fields.serialize(serializer)
}

/// Deserializes a family through [`classify`], treating unrecognized tags as
/// errors. Backs the `Deserialize` impls of the record families.
///
/// # Errors
///
/// Fails for malformed envelopes, unknown tags, and shape mismatches.
pub fn deserialize_family<'de, D, F>(deserializer: D) -> Result<F, D::Error>
where
    D: Deserializer<'de>,
    F: RecordFamily,
{
    let envelope = Value::deserialize(deserializer)?;
    match classify::<F>(&envelope).map_err(D::Error::custom)? {
        Classification::Matched(record) => Ok(record),
        Classification::Unrecognized(unrecognized) => Err(D::Error::custom(unrecognized)),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
