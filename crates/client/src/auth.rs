//! Session establishment and validation.
//!
//! Exactly one strategy is chosen at construction:
//!
//! - **Token**: the token travels in the `ph-auth-token` header.
//! - **Credentials**: an interactive login seeds the session cookies, the
//!   `csrftoken` cookie is installed as `X-CSRFToken`, and the pair is also
//!   sent as HTTP basic auth.
//! - **Session**: a caller-supplied, already authenticated HTTP client.
//!
//! Whatever the strategy, the session is validated with `GET rest/version`
//! before the client is handed out.

use serde::Deserialize;
use soar_model::SoarError;
use tracing::{debug, info, warn};

use crate::transport::{ApiRequest, Transport};

/// Header carrying an API token.
pub const TOKEN_HEADER: &str = "ph-auth-token";

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// How the client authenticates.
#[derive(Clone)]
pub enum AuthStrategy {
    Token(String),
    Credentials { username: String, password: String },
    Session(reqwest::Client),
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::Token(_) => f.write_str("Token(<redacted>)"),
            AuthStrategy::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthStrategy::Session(_) => f.write_str("Session"),
        }
    }
}

impl AuthStrategy {
    /// Picks the single strategy the supplied parameters describe.
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// - [`SoarError::IncompleteCredentials`] if only one of username and
    ///   password is present.
    /// - [`SoarError::MissingCredentials`] if nothing is present.
    /// - [`SoarError::ConflictingCredentials`] if more than one strategy is
    ///   present.
    pub fn resolve(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
        session: Option<reqwest::Client>,
    ) -> Result<Self, SoarError> {
        let token = token.filter(|token| !token.is_empty());
        let username = username.filter(|username| !username.is_empty());
        let password = password.filter(|password| !password.is_empty());

        let credentials = match (username, password) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => return Err(SoarError::IncompleteCredentials),
        };

        match (token, credentials, session) {
            (None, None, None) => Err(SoarError::MissingCredentials),
            (Some(token), None, None) => Ok(AuthStrategy::Token(token)),
            (None, Some((username, password)), None) => {
                Ok(AuthStrategy::Credentials { username, password })
            }
            (None, None, Some(session)) => Ok(AuthStrategy::Session(session)),
            _ => Err(SoarError::ConflictingCredentials),
        }
    }

    /// Short name used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            AuthStrategy::Token(_) => "token",
            AuthStrategy::Credentials { .. } => "credentials",
            AuthStrategy::Session(_) => "session",
        }
    }
}

/// Installs the token header on every subsequent request.
pub(crate) fn install_token(transport: &mut Transport, token: &str) -> Result<(), SoarError> {
    transport.set_session_header(TOKEN_HEADER, token)
}

/// Logs in with a username and password and installs the anti-forgery header.
pub(crate) async fn login(
    transport: &mut Transport,
    username: &str,
    password: &str,
) -> Result<(), SoarError> {
    let base = transport.base_url().to_string();
    let login_url = format!("{base}login");

    let page = transport
        .raw(ApiRequest::get(&login_url).header("Accept", "text/html"))
        .await
        .map_err(|err| rejected(&base, err))?;
    let seed = page.cookie(CSRF_COOKIE).unwrap_or_default();

    let reply = transport
        .raw(
            ApiRequest::post(&login_url)
                .header("Referer", &login_url)
                .form([
                    ("username", username),
                    ("password", password),
                    ("csrfmiddlewaretoken", seed.as_str()),
                ])
                .accept_redirects(),
        )
        .await
        .map_err(|err| rejected(&base, err))?;
    debug!(status = reply.status, "Login form accepted");

    transport.set_basic_auth(username, password);
    match reply.cookie(CSRF_COOKIE).or_else(|| Some(seed).filter(|seed| !seed.is_empty())) {
        Some(csrf) => {
            transport.set_session_header(CSRF_HEADER, &csrf)?;
            transport.set_session_header("Referer", &format!("{base}rest"))?;
        }
        None => warn!("Login returned no csrftoken cookie; state-changing requests may be refused"),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    version: String,
}

/// Validates the session and returns the server version.
///
/// Any status other than 200 is an authentication failure.
pub(crate) async fn validate(transport: &Transport) -> Result<String, SoarError> {
    let base = transport.base_url().to_string();
    let url = format!("{}version", transport.rest_url());
    let response = transport
        .raw(ApiRequest::get(&url))
        .await
        .map_err(|err| rejected(&base, err))?;
    if response.status != 200 {
        return Err(SoarError::Authentication {
            url: base,
            message: format!("session validation answered {}", response.status),
        });
    }
    let version = serde_json::from_slice::<VersionInfo>(&response.body)
        .map(|info| info.version)
        .unwrap_or_default();
    info!(version = %version, "Session validated");
    Ok(version)
}

/// Turns a server rejection during session setup into an authentication
/// failure. Transport failures pass through unchanged.
fn rejected(base: &str, err: SoarError) -> SoarError {
    match err {
        SoarError::Server(server) => SoarError::Authentication {
            url: base.to_string(),
            message: format!("{} {}: {}", server.status, server.reason, server.message),
        },
        other => other,
    }
}
