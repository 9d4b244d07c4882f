//! Closed sets of wire tags.
//!
//! Every record family and message family exposes its discriminant values as an
//! enum implementing [`Discriminant`]. The [`discriminant!`](crate::discriminant)
//! macro generates such an enum together with its string conversions and serde
//! support, taking the wire text of each variant verbatim.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A closed, ordered set of string tags selecting one variant of a family.
pub trait Discriminant:
    Copy + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static
{
    /// Every tag of the set, in declaration order.
    const ALL: &'static [Self];

    /// Returns the exact wire text of the tag.
    fn as_str(self) -> &'static str;

    /// Looks up a tag by its wire text.
    ///
    /// Matching is exact and case-sensitive and walks [`Self::ALL`] in declaration
    /// order, so the first (and only) equal candidate wins.
    #[must_use]
    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == tag)
    }

    /// Position of the tag within [`Self::ALL`].
    #[must_use]
    fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or_default()
    }
}

/// Declares a [`Discriminant`](crate::Discriminant) enum.
///
/// ```
/// use controller_primitives::{discriminant, Discriminant};
///
/// discriminant! {
///     /// Lifecycle of a door.
///     pub enum DoorState {
///         /// Door is open.
///         Open => "open",
///         /// Door is shut.
///         Closed => "closed",
///     }
/// }
///
/// assert_eq!(DoorState::from_tag("closed"), Some(DoorState::Closed));
/// assert_eq!(DoorState::from_tag("Closed"), None);
/// ```
#[macro_export]
macro_rules! discriminant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $tag:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Wire text of every tag, in declaration order.
            pub const TAGS: &'static [&'static str] = &[$($tag),+];
        }

        impl $crate::Discriminant for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str($crate::Discriminant::as_str(*self))
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                <Self as $crate::Discriminant>::from_tag(s).ok_or_else(|| {
                    $crate::Error::UnknownTag {
                        kind: stringify!($name),
                        tag: s.to_owned(),
                    }
                })
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                serializer.serialize_str($crate::Discriminant::as_str(*self))
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                let tag = <::std::string::String as $crate::__serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                <Self as $crate::Discriminant>::from_tag(&tag).ok_or_else(|| {
                    <D::Error as $crate::__serde::de::Error>::unknown_variant(&tag, Self::TAGS)
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Discriminant, Error};

    crate::discriminant! {
        enum Light {
            Red => "red",
            Amber => "amber",
            Green => "green",
        }
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(Light::from_tag("amber"), Some(Light::Amber));
        assert_eq!(Light::from_tag("AMBER"), None);
        assert_eq!(Light::from_tag(" amber"), None);
        assert_eq!(Light::from_tag(""), None);
    }

    #[test]
    fn ordinal_follows_declaration_order() {
        let ordinals: Vec<_> = Light::ALL.iter().map(|l| l.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert_eq!(Light::TAGS, &["red", "amber", "green"]);
    }

    #[test]
    fn from_str_reports_unknown_tags() {
        let err = "blue".parse::<Light>().expect_err("unknown");
        assert_eq!(
            err,
            Error::UnknownTag {
                kind: "Light",
                tag: "blue".into()
            }
        );
    }

    #[test]
    fn serde_uses_wire_text() {
        let json = serde_json::to_string(&Light::Green).expect("serialize");
        assert_eq!(json, "\"green\"");
        let back: Light = serde_json::from_str("\"red\"").expect("deserialize");
        assert_eq!(back, Light::Red);
        assert!(serde_json::from_str::<Light>("\"purple\"").is_err());
    }
}
