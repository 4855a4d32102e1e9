//! Error taxonomy for the SOAR orchestration domain.
//!
//! [`SoarError`] is the single error type crossing crate boundaries: the
//! transport, the authenticator, and the playbook orchestrator all produce it.
//! Callers that need to branch on the *kind* of failure rather than the exact
//! variant use [`SoarError::kind`].
//!
//! Nothing in this workspace retries automatically. The remote platform's side
//! effects after a partial failure are unknown, so every error propagates to
//! the caller as-is.

use std::path::PathBuf;

use thiserror::Error;

use crate::ContainerId;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Coarse classification of a [`SoarError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Ambiguous or missing construction parameters. Detected before any I/O.
    Configuration,
    /// An entity lacks a required identity or required fields. Detected before
    /// any I/O.
    Precondition,
    /// Session establishment or validation failed.
    Authentication,
    /// The remote platform answered with a non-success HTTP status.
    Server,
    /// A running playbook raised a prompt with no configured response.
    MissingApproval,
    /// A playbook reached a terminal state with exception-class log entries.
    PlaybookException,
    /// No usable HTTP response (connection failure, undecodable body).
    Transport,
    /// Local file-system access failed (export/upload).
    Io,
}

// ---------------------------------------------------------------------------
// Server errors
// ---------------------------------------------------------------------------

/// A non-success HTTP status returned by the remote platform.
///
/// `message` is the remote-supplied `message` field of the response body (or
/// the raw body when the response carries none). For status 400 the full
/// request/response dump is attached in `dump`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ServerError {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status`.
    pub reason: String,
    /// HTTP method of the failed request.
    pub method: String,
    /// Absolute URL of the failed request.
    pub url: String,
    /// Message extracted from the response body.
    pub message: String,
    /// Full request/response text, present for status 400 only.
    pub dump: Option<String>,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.dump {
            Some(dump) => write!(f, "{} {}: {}\n{}", self.status, self.reason, self.message, dump),
            None => write!(
                f,
                "{} {} {} {}: {}",
                self.status, self.reason, self.method, self.url, self.message
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every failure the SOAR client and orchestrator can report.
#[derive(Debug, Error)]
pub enum SoarError {
    /// None of token, credential pair, or authenticated session was supplied.
    #[error(
        "No credentials supplied: provide a token, a username and password, or an authenticated session"
    )]
    MissingCredentials,

    /// Only one half of a username/password pair was supplied.
    #[error("Incomplete credentials: both a username and a password are required")]
    IncompleteCredentials,

    /// More than one authentication strategy was supplied.
    #[error(
        "Conflicting credentials: supply exactly one of a token, a username and password, or an authenticated session"
    )]
    ConflictingCredentials,

    /// A request was built with an HTTP method the transport does not support.
    ///
    /// This is a programming error and is reported before any I/O.
    #[error("Unsupported HTTP method '{method}': use GET, POST, PUT, PATCH or DELETE")]
    UnsupportedMethod {
        /// The rejected method string.
        method: String,
    },

    /// A construction parameter is malformed (e.g. an unparsable base URL).
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem.
        message: String,
    },

    /// The operation requires a container that has been created remotely.
    #[error("Container not initialized: {operation} requires a container with a server-assigned id")]
    ContainerNotInitialized {
        /// Name of the operation that was refused.
        operation: &'static str,
    },

    /// The operation requires a container that has *not* been created yet.
    #[error("Container {id} already exists: {operation} cannot reuse an existing container")]
    ContainerAlreadyCreated {
        /// Name of the operation that was refused.
        operation: &'static str,
        /// The identity the container already carries.
        id: ContainerId,
    },

    /// The operation requires an artifact that has been created remotely.
    #[error("Artifact not initialized: {operation} requires an artifact with a server-assigned id")]
    ArtifactNotInitialized {
        /// Name of the operation that was refused.
        operation: &'static str,
    },

    /// An entity lacks the attributes an operation needs (e.g. name and label).
    #[error("Object missing required attributes: {message}")]
    ObjectMissingAttributes {
        /// Which object and which attributes.
        message: String,
    },

    /// A playbook run was requested without any playbook to run.
    #[error("No playbooks supplied: {operation} requires playbooks on the container or as arguments")]
    NoPlaybooks {
        /// Name of the operation that was refused.
        operation: &'static str,
    },

    /// A lookup by name or hash matched nothing.
    #[error("{what} '{name}' not found on the server")]
    NotFound {
        /// Kind of record looked up.
        what: &'static str,
        /// The name, hash, or id looked up.
        name: String,
    },

    /// A playbook name lookup matched more than one definition.
    #[error("Playbook '{name}' matches {count} playbooks; provide a more specific name")]
    AmbiguousPlaybook {
        /// The name looked up.
        name: String,
        /// Number of matching definitions.
        count: usize,
    },

    /// Session establishment or validation was rejected.
    #[error("Failed to authenticate to {url}: {message}")]
    Authentication {
        /// Base URL of the remote platform.
        url: String,
        /// What was rejected.
        message: String,
    },

    /// The remote platform answered with a non-success status.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// A running playbook raised a prompt that has no configured response.
    #[error(
        "Failed to answer approvals on container {container}: prompt '{prompt}' not found in the prompts of playbook '{playbook}'"
    )]
    MissingApprovalResponse {
        /// Container the prompt was raised on.
        container: ContainerId,
        /// Name of the unanswered prompt.
        prompt: String,
        /// Playbook whose prompt mapping was consulted.
        playbook: String,
    },

    /// A playbook finished with exception-class log entries.
    ///
    /// `message` is the concatenation of every exception entry's text, in log
    /// order.
    #[error("Playbook '{playbook}' raised exceptions: {message}")]
    PlaybookException {
        /// Name of the failing playbook.
        playbook: String,
        /// Concatenated exception messages.
        message: String,
    },

    /// The request produced no HTTP response.
    #[error("Transport failure for {method} {url}: {message}")]
    Transport {
        /// HTTP method of the request.
        method: String,
        /// Absolute URL of the request.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// A success response whose body could not be decoded as expected.
    #[error("Unexpected response from {url}: {message}")]
    InvalidResponse {
        /// Absolute URL of the request.
        url: String,
        /// What was wrong with the body.
        message: String,
    },

    /// Local file-system access failed.
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SoarError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SoarError::MissingCredentials
            | SoarError::IncompleteCredentials
            | SoarError::ConflictingCredentials
            | SoarError::UnsupportedMethod { .. }
            | SoarError::InvalidConfiguration { .. } => ErrorKind::Configuration,
            SoarError::ContainerNotInitialized { .. }
            | SoarError::ContainerAlreadyCreated { .. }
            | SoarError::ArtifactNotInitialized { .. }
            | SoarError::ObjectMissingAttributes { .. }
            | SoarError::NoPlaybooks { .. }
            | SoarError::NotFound { .. }
            | SoarError::AmbiguousPlaybook { .. } => ErrorKind::Precondition,
            SoarError::Authentication { .. } => ErrorKind::Authentication,
            SoarError::Server(_) => ErrorKind::Server,
            SoarError::MissingApprovalResponse { .. } => ErrorKind::MissingApproval,
            SoarError::PlaybookException { .. } => ErrorKind::PlaybookException,
            SoarError::Transport { .. } | SoarError::InvalidResponse { .. } => ErrorKind::Transport,
            SoarError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the HTTP status if this is a server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SoarError::Server(err) => Some(err.status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status: u16, dump: Option<&str>) -> ServerError {
        ServerError {
            status,
            reason: "Bad Request".into(),
            method: "POST".into(),
            url: "https://soar.test/rest/container".into(),
            message: "Label \"foobar\" is not a known label.".into(),
            dump: dump.map(str::to_string),
        }
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(SoarError::IncompleteCredentials.kind(), ErrorKind::Configuration);
        assert_eq!(
            SoarError::ContainerNotInitialized { operation: "run_playbooks" }.kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            SoarError::from(server_error(500, None)).kind(),
            ErrorKind::Server
        );
        assert_eq!(
            SoarError::MissingApprovalResponse {
                container: ContainerId::new(1),
                prompt: "p".into(),
                playbook: "pb".into(),
            }
            .kind(),
            ErrorKind::MissingApproval
        );
    }

    #[test]
    fn missing_and_incomplete_credentials_are_distinct() {
        assert_ne!(
            SoarError::MissingCredentials.to_string(),
            SoarError::IncompleteCredentials.to_string()
        );
    }

    #[test]
    fn bad_request_display_embeds_the_dump() {
        let err = SoarError::from(server_error(400, Some("POST https://soar.test/rest/container")));
        assert_eq!(err.status(), Some(400));
        let text = err.to_string();
        assert!(text.contains("not a known label"));
        assert!(text.contains("POST https://soar.test/rest/container"));
    }

    #[test]
    fn other_statuses_display_method_and_url() {
        let text = server_error(503, None).to_string();
        assert!(text.starts_with("503"));
        assert!(text.contains("POST https://soar.test/rest/container"));
    }
}
