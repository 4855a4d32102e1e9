//! Newtype domain identifiers.
//!
//! Every record the remote platform assigns an identity to is represented by a
//! distinct newtype wrapping the server's integer id. This prevents accidentally
//! passing, for example, a [`ContainerId`] where an [`ArtifactId`] is expected
//! even though both are `u64` on the wire.
//!
//! Server-assigned identifiers are never "empty" for the purposes of
//! [`crate::sparse`]: an `Option<ContainerId>` is populated exactly when it is
//! `Some`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (server-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display, Populated.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl crate::sparse::Populated for $name {
            fn is_empty(&self) -> bool {
                false
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: case records
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a container (case/incident record).
    ///
    /// Absent on a locally constructed container until it has been created
    /// remotely; cleared again when the container is deleted.
    ContainerId
}

u64_id! {
    /// Identifies an artifact (evidence record) owned by one container.
    ArtifactId
}

u64_id! {
    /// Identifies a note attached to a container.
    NoteId
}

u64_id! {
    /// Identifies a pin (HUD card) attached to a container.
    PinId
}

u64_id! {
    /// Identifies a vault attachment of a container.
    AttachmentId
}

// ---------------------------------------------------------------------------
// Identifiers: automation
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a playbook *definition* (the workflow itself).
    ///
    /// Distinct from [`PlaybookRunId`]: one definition has many runs.
    PlaybookId
}

u64_id! {
    /// Identifies one run of a playbook against a container.
    ///
    /// Assigned by the remote engine when the run is started.
    PlaybookRunId
}

u64_id! {
    /// Identifies one action run (a single automated step inside a playbook run).
    ActionRunId
}

u64_id! {
    /// Identifies an app run: the execution report backing an action run.
    AppRunId
}

u64_id! {
    /// Identifies an approval (an interactive prompt raised by a running playbook).
    ApprovalId
}

// ---------------------------------------------------------------------------
// Identifiers: catalog
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies an installed app (integration) on the remote platform.
    AppId
}

u64_id! {
    /// Identifies a configured asset (an app instance with credentials).
    AssetId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one orchestration invocation (one call that starts and drives
/// playbook runs to completion).
///
/// Generated fresh for every invocation and recorded on tracing spans so all
/// requests issued on behalf of a single invocation can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrchestrationId(Uuid);

impl OrchestrationId {
    /// Generates a new random orchestration identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for OrchestrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let id = ContainerId::new(42);
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(42));

        let parsed: ArtifactId = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(parsed.as_u64(), 7);
    }

    #[test]
    fn orchestration_ids_are_unique() {
        assert_ne!(OrchestrationId::new_random(), OrchestrationId::new_random());
    }
}
