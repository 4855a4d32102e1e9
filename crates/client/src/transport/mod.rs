//! The transport primitive: one authenticated request per call.
//!
//! [`Transport::send`] resolves the endpoint against the REST root, applies
//! the session headers, records the exchange in the [`AuditLog`], classifies
//! non-success statuses, and returns the body in the [`ResponseShape`] the
//! request asked for. Nothing is retried.

mod audit;
mod error;
mod method;
mod query;
mod request;

pub use audit::{AuditLog, AuditRecord, AuditResponse, REDACTED};
pub use method::HttpMethod;
pub use query::{Query, QueryValue};
pub use request::{ApiRequest, Body, FilePart, ResponseShape};

pub(crate) use error::invalid_response;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, SET_COOKIE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use soar_model::SoarError;
use tracing::{debug, warn};

use error::{map_http_status, map_reqwest_error};

/// An undecoded success response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Value of the cookie `name` set by this response.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|header| header.split(';').next()?.split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim().to_string())
    }
}

/// A successful exchange in the requested [`ResponseShape`].
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Raw(RawResponse),
}

/// Issues requests against one remote platform.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    rest_url: Url,
    session_headers: HeaderMap,
    basic_auth: Option<(String, String)>,
    audit: AuditLog,
}

impl Transport {
    /// Creates a transport rooted at `base_url`.
    ///
    /// A trailing slash is added when missing; the REST root is
    /// `{base_url}rest/`.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, SoarError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|err| SoarError::InvalidConfiguration {
            message: format!("invalid server url '{base_url}': {err}"),
        })?;
        let rest_url = base_url
            .join("rest/")
            .map_err(|err| SoarError::InvalidConfiguration {
                message: format!("invalid server url '{base_url}': {err}"),
            })?;
        Ok(Self {
            http,
            base_url,
            rest_url,
            session_headers: HeaderMap::new(),
            basic_auth: None,
            audit: AuditLog::new(),
        })
    }

    /// The server root, with a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The REST root, `{base_url}rest/`.
    pub fn rest_url(&self) -> &str {
        self.rest_url.as_str()
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Adds a header sent with every subsequent request.
    pub(crate) fn set_session_header(&mut self, name: &str, value: &str) -> Result<(), SoarError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            SoarError::InvalidConfiguration {
                message: format!("invalid header name '{name}': {err}"),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|err| SoarError::InvalidConfiguration {
            message: format!("invalid value for header '{name}': {err}"),
        })?;
        self.session_headers.insert(name, value);
        Ok(())
    }

    /// Sends HTTP basic credentials with every subsequent request.
    pub(crate) fn set_basic_auth(&mut self, username: &str, password: &str) {
        self.basic_auth = Some((username.to_string(), password.to_string()));
    }

    /// Resolves `endpoint` against the REST root unless it is already absolute.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, SoarError> {
        let resolved = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Url::parse(endpoint)
        } else {
            self.rest_url.join(endpoint.trim_start_matches('/'))
        };
        resolved.map_err(|err| SoarError::InvalidConfiguration {
            message: format!("invalid endpoint '{endpoint}': {err}"),
        })
    }

    /// Issues `request` and returns the body in the requested shape.
    ///
    /// # Errors
    ///
    /// - [`SoarError::Server`] for any non-success status (3xx included unless
    ///   the request accepts redirects).
    /// - [`SoarError::Transport`] when no response was received.
    /// - [`SoarError::InvalidResponse`] when the body does not decode.
    pub async fn send(&self, request: ApiRequest) -> Result<Reply, SoarError> {
        let mut url = self.resolve(&request.endpoint)?;
        let pairs = request.query.encode();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(&pairs);
        }
        let method = request.method.as_str();
        let mut record = AuditRecord::request(method, url.as_str());

        let headers = self.request_headers(&request)?;
        for (name, value) in &headers {
            record.header(name.as_str(), value.to_str().unwrap_or_default());
        }

        let mut builder = self
            .http
            .request(request.method.to_reqwest(), url.clone())
            .headers(headers);
        if let Some((username, password)) = &self.basic_auth {
            record.header("authorization", "");
            builder = builder.basic_auth(username, Some(password));
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(body) => {
                record.body = body.to_string();
                builder.json(&body)
            }
            Body::Form(fields) => {
                record.form_body(&fields);
                builder.form(&fields)
            }
            Body::Multipart { fields, file } => {
                record.body = format!(
                    "<multipart: {} field(s), {} '{}' ({} bytes)>",
                    fields.len(),
                    file.field,
                    file.file_name,
                    file.bytes.len()
                );
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
                builder.multipart(form.part(file.field, part))
            }
        };

        debug!(method, url = %url, "Sending request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                record.fail(err.to_string());
                self.audit.push(record);
                warn!(method, url = %url, error = %err, "Request produced no response");
                return Err(map_reqwest_error(method, url.as_str(), &err));
            }
        };

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(err) => {
                record.fail(err.to_string());
                self.audit.push(record);
                return Err(map_reqwest_error(method, url.as_str(), &err));
            }
        };
        let text = String::from_utf8_lossy(&body).into_owned();
        record.respond(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            &text,
        );

        let accepted = status.is_success() || (request.accept_redirects && status.is_redirection());
        if !accepted {
            let err = map_http_status(status, &text, &record);
            self.audit.push(record);
            warn!(method, url = %url, status = status.as_u16(), "Request failed");
            return Err(err);
        }
        self.audit.push(record);
        debug!(method, url = %url, status = status.as_u16(), "Request succeeded");

        match request.shape {
            ResponseShape::Raw => Ok(Reply::Raw(RawResponse {
                status: status.as_u16(),
                headers: response_headers,
                body,
            })),
            ResponseShape::Json => Ok(Reply::Json(decode_body(url.as_str(), &body)?)),
            ResponseShape::Data => {
                let mut json = decode_body(url.as_str(), &body)?;
                match json.get_mut("data") {
                    Some(data) => Ok(Reply::Json(data.take())),
                    None => Err(invalid_response(url.as_str(), "response carries no 'data' field")),
                }
            }
        }
    }

    /// Sends `request` and returns the decoded JSON body.
    pub async fn json(&self, request: ApiRequest) -> Result<Value, SoarError> {
        match self.send(request.shape(ResponseShape::Json)).await? {
            Reply::Json(json) => Ok(json),
            Reply::Raw(raw) => decode_body("", &raw.body),
        }
    }

    /// Sends `request` and returns the undecoded response.
    pub async fn raw(&self, request: ApiRequest) -> Result<RawResponse, SoarError> {
        let endpoint = request.endpoint.clone();
        match self.send(request.shape(ResponseShape::Raw)).await? {
            Reply::Raw(raw) => Ok(raw),
            Reply::Json(_) => Err(invalid_response(&endpoint, "expected an undecoded response")),
        }
    }

    /// Sends `request` and decodes its `data` list into `T`s.
    pub async fn list<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<T>, SoarError> {
        let endpoint = request.endpoint.clone();
        let data = match self.send(request.shape(ResponseShape::Data)).await? {
            Reply::Json(data) => data,
            Reply::Raw(raw) => decode_body(&endpoint, &raw.body)?,
        };
        serde_json::from_value(data).map_err(|err| invalid_response(&endpoint, err.to_string()))
    }

    /// Sends `request` and decodes the whole JSON body into `T`.
    pub async fn decode<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, SoarError> {
        let endpoint = request.endpoint.clone();
        let json = self.json(request).await?;
        serde_json::from_value(json).map_err(|err| invalid_response(&endpoint, err.to_string()))
    }

    fn request_headers(&self, request: &ApiRequest) -> Result<HeaderMap, SoarError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &self.session_headers {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                SoarError::InvalidConfiguration {
                    message: format!("invalid header name '{name}': {err}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                SoarError::InvalidConfiguration {
                    message: format!("invalid value for header '{name}': {err}"),
                }
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Decodes a JSON body; an empty body decodes as `null`.
fn decode_body(url: &str, body: &[u8]) -> Result<Value, SoarError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|err| invalid_response(url, format!("invalid JSON body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> Transport {
        Transport::new(reqwest::Client::new(), base).unwrap()
    }

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let transport = transport("https://soar.test");
        assert_eq!(transport.base_url(), "https://soar.test/");
        assert_eq!(transport.rest_url(), "https://soar.test/rest/");
    }

    #[test]
    fn relative_endpoints_resolve_under_rest() {
        let transport = transport("https://soar.test/");
        assert_eq!(
            transport.resolve("container/4").unwrap().as_str(),
            "https://soar.test/rest/container/4"
        );
        assert_eq!(
            transport.resolve("/approval/9").unwrap().as_str(),
            "https://soar.test/rest/approval/9"
        );
        assert_eq!(
            transport.resolve("https://soar.test/login").unwrap().as_str(),
            "https://soar.test/login"
        );
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = Transport::new(reqwest::Client::new(), "not a url").unwrap_err();
        assert!(matches!(err, SoarError::InvalidConfiguration { .. }));
    }

    #[test]
    fn cookies_are_read_from_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("sessionid=abc; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("csrftoken=xyz; Path=/"));
        let raw = RawResponse {
            status: 200,
            headers,
            body: Vec::new(),
        };
        assert_eq!(raw.cookie("csrftoken").as_deref(), Some("xyz"));
        assert_eq!(raw.cookie("missing"), None);
    }
}
