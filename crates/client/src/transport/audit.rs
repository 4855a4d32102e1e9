//! Append-only record of every request/response exchange.
//!
//! The audit log lives for as long as the client and is never trimmed. Secret
//! header values and form passwords are redacted when a record is captured,
//! so a snapshot can be written to disk as-is.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Replacement text for redacted values.
pub const REDACTED: &str = "<redacted>";

/// Headers whose values never appear in the audit log.
const SECRET_HEADERS: [&str; 4] = ["ph-auth-token", "authorization", "cookie", "x-csrftoken"];

/// Form fields whose values never appear in the audit log.
const SECRET_FIELDS: [&str; 1] = ["password"];

const REQUEST_RULE: &str = "─────────────── Request ───────────────";
const RESPONSE_RULE: &str = "─────────────── Response ───────────────";
const CLOSING_RULE: &str = "────────────────────────────────────────";

/// The response half of an [`AuditRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// One request and, when the server answered, its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub method: String,
    pub url: String,
    /// Request headers in send order, secret values redacted.
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// `None` when no HTTP response was received.
    pub response: Option<AuditResponse>,
    /// Why no response was received.
    pub failure: Option<String>,
}

impl AuditRecord {
    pub(crate) fn request(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: String::new(),
            response: None,
            failure: None,
        }
    }

    /// Records a request header, redacting secret values.
    pub(crate) fn header(&mut self, name: &str, value: &str) {
        let value = if is_secret_header(name) {
            REDACTED.to_string()
        } else {
            value.to_string()
        };
        self.headers.push((name.to_ascii_lowercase(), value));
    }

    /// Records an url-encoded form body, redacting secret fields.
    pub(crate) fn form_body(&mut self, fields: &[(String, String)]) {
        self.body = fields
            .iter()
            .map(|(name, value)| {
                if SECRET_FIELDS.contains(&name.as_str()) {
                    format!("{name}={REDACTED}")
                } else {
                    format!("{name}={value}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
    }

    pub(crate) fn respond(&mut self, status: u16, reason: &str, body: &str) {
        self.response = Some(AuditResponse {
            status,
            reason: reason.to_string(),
            body: body.to_string(),
        });
    }

    pub(crate) fn fail(&mut self, failure: impl Into<String>) {
        self.failure = Some(failure.into());
    }
}

fn is_secret_header(name: &str) -> bool {
    SECRET_HEADERS
        .iter()
        .any(|secret| secret.eq_ignore_ascii_case(name))
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{REQUEST_RULE}")?;
        writeln!(f, "{} {}", self.method, self.url)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f, "{}", self.body)?;
        writeln!(f, "{RESPONSE_RULE}")?;
        match (&self.response, &self.failure) {
            (Some(response), _) => {
                writeln!(f, "{} {} {}", response.status, response.reason, self.url)?;
                writeln!(f, "{}", response.body)?;
            }
            (None, Some(failure)) => writeln!(f, "no response: {failure}")?,
            (None, None) => writeln!(f, "no response")?,
        }
        write!(f, "{CLOSING_RULE}")
    }
}

/// Process-lifetime list of [`AuditRecord`]s.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, record: AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Copies every record captured so far.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders every record, one after another.
    pub fn render(&self) -> String {
        self.snapshot()
            .iter()
            .map(|record| format!("{record}\n"))
            .collect()
    }
}
