//! Internal helpers mapping HTTP and reqwest failures to [`SoarError`].

use soar_model::{ServerError, SoarError};

use super::audit::AuditRecord;

/// Maps a non-success status to a [`SoarError::Server`].
///
/// The message is the body's `message` field, or the raw body when there is
/// none. A 400 additionally carries the rendered exchange.
pub(crate) fn map_http_status(
    status: reqwest::StatusCode,
    body: &str,
    record: &AuditRecord,
) -> SoarError {
    let dump = (status == reqwest::StatusCode::BAD_REQUEST).then(|| record.to_string());
    SoarError::Server(ServerError {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        method: record.method.clone(),
        url: record.url.clone(),
        message: server_message(body),
        dump,
    })
}

/// Maps a failure that produced no usable HTTP response.
pub(crate) fn map_reqwest_error(method: &str, url: &str, err: &reqwest::Error) -> SoarError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    SoarError::Transport {
        method: method.to_string(),
        url: url.to_string(),
        message,
    }
}

pub(crate) fn invalid_response(url: &str, message: impl Into<String>) -> SoarError {
    SoarError::InvalidResponse {
        url: url.to_string(),
        message: message.into(),
    }
}

fn server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| match json.get("message")? {
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| body.to_string())
}
