//! Domain entities mirrored from the remote platform.
//!
//! Every entity is declared with [`crate::sparse::entity!`] and therefore
//! serializes sparsely and merges field-wise.

mod action;
mod annotation;
mod artifact;
mod catalog;
mod container;
mod playbook;

pub use action::{Action, ActionDefinition, AppRun};
pub use annotation::{Note, Pin};
pub use artifact::Artifact;
pub use catalog::{App, Asset};
pub use container::Container;
pub use playbook::{Approval, Playbook, PlaybookDefinition, PlaybookLog, EXCEPTION_MESSAGE_TYPE};

pub(crate) use playbook::short_name;
