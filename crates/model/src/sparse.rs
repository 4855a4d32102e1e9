//! Sparse serialization and field-wise merge, shared by every entity.
//!
//! Entities are declared through [`entity!`], which enumerates the entity's
//! fields exactly once and derives two behaviours from that list:
//!
//! - **Sparse serialization.** A field whose value [`Populated::is_empty`] is
//!   omitted from the serialized form. Outbound payloads therefore never reset
//!   a server-side field to empty.
//! - **Merge.** [`Merge::merge`] overwrites a held field only when the incoming
//!   value is populated. A partial or stale snapshot never erases data the
//!   caller already holds.
//!
//! Inbound, every field tolerates both a missing key and an explicit `null`
//! (both decode to the field type's default), so a sparse server response
//! always decodes.
//!
//! ## What counts as empty
//!
//! | Type | Empty when |
//! |------|------------|
//! | `String`, `Vec<T>`, maps | no characters / elements |
//! | `bool` | `false` |
//! | `Option<T>` | `None`, or `Some(v)` where `v` is empty |
//! | integers, floats, identifiers, timestamps | never |
//! | `serde_json::Value` | `null`, `""`, `[]`, `{}` |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

/// Whether a field value carries information worth transmitting or merging.
pub trait Populated {
    /// Returns `true` if the value is empty, null, or the type's default.
    fn is_empty(&self) -> bool;
}

/// Field-wise merge of a freshly fetched snapshot into a held entity.
pub trait Merge {
    /// Overwrites each field of `self` with the corresponding field of
    /// `incoming` when, and only when, the incoming value is populated.
    fn merge(&mut self, incoming: Self);
}

/// Capability shared by every domain entity.
///
/// Implemented by [`entity!`]; never implemented by hand.
pub trait Entity: Merge + Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Short lower-case entity name used in logs and error messages.
    const KIND: &'static str;

    /// Encodes the entity for an outbound request, omitting empty fields.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Free-function form of [`Populated::is_empty`], usable as a serde
/// `skip_serializing_if` predicate.
pub fn is_empty<T: Populated + ?Sized>(value: &T) -> bool {
    value.is_empty()
}

/// Replaces `held` with `incoming` if `incoming` is populated.
pub fn merge_field<T: Populated>(held: &mut T, incoming: T) {
    if !incoming.is_empty() {
        *held = incoming;
    }
}

/// Deserializes an explicit `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Populated implementations
// ---------------------------------------------------------------------------

impl Populated for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl Populated for str {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl Populated for bool {
    fn is_empty(&self) -> bool {
        !*self
    }
}

macro_rules! never_empty {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Populated for $ty {
                fn is_empty(&self) -> bool {
                    false
                }
            }
        )*
    };
}

never_empty!(u8, u16, u32, u64, i32, i64, f64);

impl<T: Populated> Populated for Option<T> {
    fn is_empty(&self) -> bool {
        self.as_ref().map_or(true, Populated::is_empty)
    }
}

impl<T> Populated for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T> Populated for BTreeSet<T> {
    fn is_empty(&self) -> bool {
        BTreeSet::is_empty(self)
    }
}

impl<K, V> Populated for BTreeMap<K, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl<K, V, S> Populated for HashMap<K, V, S> {
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl Populated for serde_json::Value {
    fn is_empty(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity declaration macro
// ---------------------------------------------------------------------------

/// Declares a domain entity.
///
/// Generates the struct (with `Debug`, `Clone`, `Default`, `Serialize`,
/// `Deserialize`), marks every field as sparse and null-tolerant, and
/// implements [`Merge`] and [`Entity`] by enumerating the declared fields.
/// Extra derives and per-field serde attributes (`rename`, …) pass through.
macro_rules! entity {
    (
        $(#[$attr:meta])*
        $kind:literal => pub struct $name:ident {
            $(
                $(#[$fattr:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$fattr])*
                #[serde(
                    skip_serializing_if = "crate::sparse::is_empty",
                    deserialize_with = "crate::sparse::null_as_default"
                )]
                pub $field: $ty,
            )*
        }

        impl crate::sparse::Merge for $name {
            fn merge(&mut self, incoming: Self) {
                $( crate::sparse::merge_field(&mut self.$field, incoming.$field); )*
            }
        }

        impl crate::sparse::Entity for $name {
            const KIND: &'static str = $kind;
        }
    };
}

pub(crate) use entity;
