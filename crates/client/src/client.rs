//! The SOAR REST client and its builder.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use soar_model::SoarError;
use tracing::info;

use crate::auth::{self, AuthStrategy};
use crate::catalog::Catalog;
use crate::transport::{ApiRequest, AuditLog, Reply, Transport};

/// Authenticated client for one SOAR server.
///
/// Construct with [`SoarClient::builder`]. The session is established and
/// validated by [`SoarClientBuilder::connect`]; a `SoarClient` is therefore
/// always authenticated.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), soar_model::SoarError> {
/// use soar_client::SoarClient;
///
/// let client = SoarClient::builder("https://soar.example.com")
///     .token("my-api-token")
///     .connect()
///     .await?;
/// println!("connected to SOAR {}", client.version());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SoarClient {
    pub(crate) transport: Transport,
    version: String,
    pub(crate) catalog: Mutex<Option<Arc<Catalog>>>,
}

impl SoarClient {
    /// Starts configuring a client for the server at `url`.
    pub fn builder(url: impl Into<String>) -> SoarClientBuilder {
        SoarClientBuilder::new(url)
    }

    /// Server version reported during session validation.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The server root, with a trailing slash.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Every request/response exchange issued by this client so far.
    pub fn audit_log(&self) -> &AuditLog {
        self.transport.audit_log()
    }

    /// Issues an arbitrary request through the authenticated transport.
    pub async fn request(&self, request: ApiRequest) -> Result<Reply, SoarError> {
        self.transport.send(request).await
    }

    /// Drops the cached apps, actions and assets; the next catalog read
    /// fetches them again.
    pub fn invalidate_catalog(&self) {
        *self.catalog.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Configures and connects a [`SoarClient`].
#[derive(Debug)]
pub struct SoarClientBuilder {
    url: String,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    session: Option<reqwest::Client>,
    verify_tls: bool,
    timeout: Option<Duration>,
}

impl SoarClientBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            username: None,
            password: None,
            session: None,
            verify_tls: false,
            timeout: None,
        }
    }

    /// Authenticates with an API token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Authenticates with a username and password.
    #[must_use]
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username(username).password(password)
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Uses an already authenticated HTTP client as-is.
    ///
    /// TLS, redirect and timeout settings of the builder do not apply to it.
    #[must_use]
    pub fn session(mut self, session: reqwest::Client) -> Self {
        self.session = Some(session);
        self
    }

    /// Enables TLS certificate verification. Disabled by default because
    /// SOAR servers commonly present self-signed certificates.
    #[must_use]
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Per-request timeout. None by default.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Establishes and validates the session.
    ///
    /// # Errors
    ///
    /// - Configuration errors for missing, incomplete or conflicting
    ///   credentials and for an unparsable URL. No request is issued.
    /// - [`SoarError::Authentication`] if the server rejects the login or the
    ///   validation request.
    /// - [`SoarError::Transport`] if the server cannot be reached.
    pub async fn connect(self) -> Result<SoarClient, SoarError> {
        let strategy =
            AuthStrategy::resolve(self.token, self.username, self.password, self.session)?;

        let http = match &strategy {
            AuthStrategy::Session(session) => session.clone(),
            _ => {
                let mut builder = reqwest::Client::builder()
                    .redirect(reqwest::redirect::Policy::none())
                    .cookie_store(true)
                    .danger_accept_invalid_certs(!self.verify_tls);
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|err| SoarError::InvalidConfiguration {
                    message: format!("cannot build HTTP client: {err}"),
                })?
            }
        };
        let mut transport = Transport::new(http, &self.url)?;

        match &strategy {
            AuthStrategy::Token(token) => auth::install_token(&mut transport, token)?,
            AuthStrategy::Credentials { username, password } => {
                auth::login(&mut transport, username, password).await?;
            }
            AuthStrategy::Session(_) => {}
        }
        let version = auth::validate(&transport).await?;
        info!(
            url = transport.base_url(),
            strategy = strategy.label(),
            version = %version,
            "Connected to SOAR"
        );

        Ok(SoarClient {
            transport,
            version,
            catalog: Mutex::new(None),
        })
    }
}
