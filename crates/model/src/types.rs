//! Shared value types for the SOAR orchestration domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values that shape requests to the remote engine (run scope,
//! playbook start target) or wrap wall-clock times reported by it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ArtifactId, PlaybookId};

// ---------------------------------------------------------------------------
// Run scope
// ---------------------------------------------------------------------------

/// Which artifacts of a container a playbook run operates on.
///
/// Encoded on the wire as `"all"`, `"new"`, or a JSON array of artifact ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunScope {
    /// Every artifact on the container.
    #[default]
    All,
    /// Only artifacts added since the last run.
    New,
    /// An explicit set of artifacts.
    Artifacts(Vec<ArtifactId>),
}

impl Serialize for RunScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RunScope::All => serializer.serialize_str("all"),
            RunScope::New => serializer.serialize_str("new"),
            RunScope::Artifacts(ids) => ids.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RunScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            Artifacts(Vec<ArtifactId>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(word) => match word.as_str() {
                "all" => Ok(RunScope::All),
                "new" => Ok(RunScope::New),
                other => Err(serde::de::Error::custom(format!(
                    "unknown run scope '{other}', expected \"all\", \"new\" or a list of artifact ids"
                ))),
            },
            Repr::Artifacts(ids) => Ok(RunScope::Artifacts(ids)),
        }
    }
}

// ---------------------------------------------------------------------------
// Playbook start target
// ---------------------------------------------------------------------------

/// How a playbook run request names the workflow to start.
///
/// The remote engine accepts either the definition id or the playbook name in
/// the same `playbook_id` field; the id is preferred when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlaybookTarget {
    /// The playbook definition id.
    Id(PlaybookId),
    /// The playbook name, optionally prefixed with its repository (`"repo/name"`).
    Name(String),
}

impl std::fmt::Display for PlaybookTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybookTarget::Id(id) => write!(f, "playbook #{id}"),
            PlaybookTarget::Name(name) => write!(f, "playbook '{name}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hash lookup kind
// ---------------------------------------------------------------------------

/// Record types that can be looked up by their server-computed hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashedObject {
    /// An artifact record.
    Artifact,
    /// A container record.
    Container,
}

impl HashedObject {
    /// Returns the REST endpoint listing records of this kind.
    pub fn endpoint(self) -> &'static str {
        match self {
            HashedObject::Artifact => "artifact",
            HashedObject::Container => "container",
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp reported by the remote platform.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl crate::sparse::Populated for Timestamp {
    fn is_empty(&self) -> bool {
        false
    }
}
