//! SOAR REST infrastructure adapter.
//!
//! Implements the [`soar_model::PlaybookEngine`] port over the SOAR REST API
//! and offers the thin REST operations (containers, artifacts, playbooks,
//! catalog, export, upload) on top of one authenticated transport.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, session authentication, query
//! encoding, audit logging and response decoding live here. The orchestrator
//! sees only [`soar_model::PlaybookEngine`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`transport`] | `Transport`, `ApiRequest`, `Query`, `AuditLog` |
//! | [`auth`] | `AuthStrategy`, login and session validation |
//! | `client` | `SoarClient` and `SoarClientBuilder` |
//! | `containers`, `artifacts`, `playbooks` | REST operations on `SoarClient` |
//! | [`catalog`] | Cached apps, actions and assets |
//! | `files` | Container export and chunked upload |
//! | `engine` | `PlaybookEngine` for `SoarClient` |
//!
//! TLS certificate verification is off unless enabled with
//! [`SoarClientBuilder::verify_tls`]; SOAR servers commonly run with
//! self-signed certificates.

pub mod auth;
pub mod catalog;
pub mod transport;

mod artifacts;
mod client;
mod containers;
mod engine;
mod files;
mod playbooks;

pub use auth::{AuthStrategy, TOKEN_HEADER};
pub use catalog::Catalog;
pub use client::{SoarClient, SoarClientBuilder};
pub use files::{UploadReceipt, UploadTarget};
pub use transport::{
    ApiRequest, AuditLog, AuditRecord, HttpMethod, Query, RawResponse, Reply, ResponseShape,
};
