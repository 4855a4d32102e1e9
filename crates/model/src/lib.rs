//! Core domain for the SOAR orchestration client.
//!
//! This crate contains every entity mirrored from the remote platform, the
//! newtype identifiers and shared value types they use, the sparse
//! serialization and merge discipline all entities follow, the error taxonomy
//! shared by every crate in the workspace, and the port traits infrastructure
//! crates implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ContainerId`, `PlaybookRunId`, etc.) |
//! | [`types`] | Shared value types (`RunScope`, `PlaybookTarget`, `Timestamp`) |
//! | [`sparse`] | `Populated`, `Merge`, `Entity` and the `entity!` declaration macro |
//! | [`entities`] | `Container`, `Artifact`, `Playbook`, `Action`, catalog records |
//! | [`errors`] | `SoarError`, `ServerError` and the coarse `ErrorKind` |
//! | [`ports`] | `PlaybookEngine`, the seam between orchestrator and transport |

pub mod entities;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod sparse;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use entities::{
    Action, ActionDefinition, App, AppRun, Approval, Artifact, Asset, Container, Note, Pin,
    Playbook, PlaybookDefinition, PlaybookLog, EXCEPTION_MESSAGE_TYPE,
};
pub use errors::{ErrorKind, ServerError, SoarError};
pub use identifiers::{
    ActionRunId, AppId, AppRunId, ApprovalId, ArtifactId, AssetId, AttachmentId, ContainerId,
    NoteId, OrchestrationId, PinId, PlaybookId, PlaybookRunId,
};
pub use ports::PlaybookEngine;
pub use sparse::{Entity, Merge, Populated};
pub use types::{HashedObject, PlaybookTarget, RunScope, Timestamp};
