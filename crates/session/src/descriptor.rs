//! Replayable request descriptors and buffered responses
//!
//! A `RequestDescriptor` owns everything needed to issue a call again: method,
//! path, query, headers, body and timeout. Bodies are kept in replayable form
//! (multipart file parts as `Bytes`) because a streamed body cannot be sent
//! twice. The "already retried" marker is only ever set by `into_retry`, which
//! consumes the descriptor and returns the marked copy.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// One part of a multipart form, held in memory so the form can be rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Bytes,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// Immutable, replayable description of an API call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    id: String,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
    refresh_exempt: bool,
    retried: bool,
}

impl RequestDescriptor {
    /// Describe a call to `path` (relative to the transport's base URL).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: format!("req_{}", uuid::Uuid::new_v4().as_simple()),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
            refresh_exempt: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> serde_json::Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Override the transport's default timeout for this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Never start or join a refresh for this call: a 401 is returned as-is.
    ///
    /// Used for credential endpoints (login, register, refresh) where a 401
    /// means wrong credentials rather than an expired session.
    pub fn exempt_from_refresh(mut self) -> Self {
        self.refresh_exempt = true;
        self
    }

    /// Consume the descriptor and return the copy marked as retried.
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_refresh_exempt(&self) -> bool {
        self.refresh_exempt
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Fully buffered successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
