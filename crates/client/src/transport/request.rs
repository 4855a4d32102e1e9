use serde_json::Value;
use soar_model::{Entity, SoarError};

use super::method::HttpMethod;
use super::query::Query;

/// What the caller wants back from a successful exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseShape {
    /// The decoded JSON body.
    #[default]
    Json,
    /// Only the `data` list embedded in the JSON body.
    Data,
    /// The undecoded response.
    Raw,
}

/// The file half of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Request body variants the transport can send.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

/// One request to the remote platform.
///
/// `endpoint` is either relative to the REST root (`"container/4"`) or an
/// absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub(crate) method: HttpMethod,
    pub(crate) endpoint: String,
    pub(crate) query: Query,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Body,
    pub(crate) shape: ResponseShape,
    pub(crate) accept_redirects: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Query::new(),
            headers: Vec::new(),
            body: Body::Empty,
            shape: ResponseShape::Json,
            accept_redirects: false,
        }
    }

    /// Builds a request from a method name.
    ///
    /// # Errors
    ///
    /// [`SoarError::UnsupportedMethod`] for anything but GET, POST, PUT, PATCH
    /// and DELETE.
    pub fn parse(method: &str, endpoint: impl Into<String>) -> Result<Self, SoarError> {
        Ok(Self::new(method.parse()?, endpoint))
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = self.query.extend(query);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    /// Sends `entity` as its sparse JSON payload.
    pub fn entity<E: Entity>(self, entity: &E) -> Result<Self, SoarError> {
        let payload = entity
            .to_payload()
            .map_err(|err| SoarError::InvalidConfiguration {
                message: format!("cannot encode {} payload: {err}", E::KIND),
            })?;
        Ok(self.json(payload))
    }

    #[must_use]
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Body::Form(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<(String, String)>, file: FilePart) -> Self {
        self.body = Body::Multipart { fields, file };
        self
    }

    #[must_use]
    pub fn shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }

    /// Treats 3xx answers as success instead of a server error.
    #[must_use]
    pub fn accept_redirects(mut self) -> Self {
        self.accept_redirects = true;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
