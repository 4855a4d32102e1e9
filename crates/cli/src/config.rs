//! Runner configuration: server, credentials and telemetry.
//!
//! Loaded from a TOML file named by `--config` or `SOAR_CONFIG`. Secrets may
//! be kept out of the file and supplied through `SOAR_TOKEN` and
//! `SOAR_PASSWORD` instead; an environment value replaces the file value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use soar_client::{AuthStrategy, SoarClient, SoarClientBuilder};

pub const CONFIG_ENV: &str = "SOAR_CONFIG";
pub const TOKEN_ENV: &str = "SOAR_TOKEN";
pub const PASSWORD_ENV: &str = "SOAR_PASSWORD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or {CONFIG_ENV})")]
    MissingConfigPath,
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub url: String,
    /// Off unless set; SOAR servers commonly use self-signed certificates.
    #[serde(default)]
    pub verify_tls: bool,
    /// Per-request timeout in seconds. No timeout when absent.
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub log_format: LogFormat,
    /// OTLP collector endpoint, e.g. `http://localhost:4317`. Spans are only
    /// exported when set.
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

fn default_service_name() -> String {
    "soar-cli".to_string()
}

impl RunnerConfig {
    /// Loads the file at `path`, applies secret overrides from the
    /// environment and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let mut config = Self::from_path(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replaces the token and password with non-empty values from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|value| !value.is_empty()) {
            self.auth.token = Some(token);
        }
        if let Some(password) = lookup(PASSWORD_ENV).filter(|value| !value.is_empty()) {
            self.auth.password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_secs",
                reason: "must be > 0".to_string(),
            });
        }
        AuthStrategy::resolve(
            self.auth.token.clone(),
            self.auth.username.clone(),
            self.auth.password.clone(),
            None,
        )
        .map_err(|err| ConfigError::InvalidValue {
            field: "auth",
            reason: err.to_string(),
        })?;
        if let Some(endpoint) = &self.telemetry.otlp_endpoint {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "telemetry.otlp_endpoint",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        Ok(())
    }

    /// A client builder carrying the server and credential settings.
    pub fn client_builder(&self) -> SoarClientBuilder {
        let mut builder = SoarClient::builder(&self.server.url).verify_tls(self.server.verify_tls);
        if let Some(secs) = self.server.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(token) = &self.auth.token {
            builder = builder.token(token);
        }
        if let Some(username) = &self.auth.username {
            builder = builder.username(username);
        }
        if let Some(password) = &self.auth.password {
            builder = builder.password(password);
        }
        builder
    }
}
