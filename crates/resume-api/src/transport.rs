//! `reqwest`-backed transport
//!
//! Builds a request from a `RequestDescriptor`, sends it, buffers the response
//! and classifies failures. 401 is the only status reported as
//! `AuthExpired`; every other non-2xx comes back as `Status` with the
//! backend's `message` field when the body is the usual JSON envelope.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use session::{ApiResponse, FormPart, RequestBody, RequestDescriptor, TransportClient, TransportError};
use tracing::{debug, warn};

/// Executes descriptors against `base_url` with a shared `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// `timeout` applies to every request that does not carry its own.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Join the base URL and a descriptor path with exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn build(&self, request: &RequestDescriptor) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), self.url_for(request.path()))
            .headers(request.headers().clone())
            .timeout(request.timeout().unwrap_or(self.timeout));

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };
        Ok(builder)
    }
}

/// Rebuild a multipart form from buffered parts. Called again for every replay.
fn build_form(parts: &[FormPart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                if let Some(content_type) = content_type {
                    file = file.mime_str(content_type).map_err(|e| {
                        TransportError::InvalidRequest(format!(
                            "invalid content type {content_type}: {e}"
                        ))
                    })?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

/// Classify a non-success response.
pub fn classify_status(status: StatusCode, body: &str) -> TransportError {
    let message = backend_message(body);
    if status == StatusCode::UNAUTHORIZED {
        TransportError::AuthExpired {
            status: status.as_u16(),
            message,
        }
    } else {
        TransportError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull `message` out of a JSON error envelope, falling back to the raw body.
fn backend_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned));
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => String::from("<no body>"),
        None => body.trim().to_owned(),
    }
}

fn send_error(context: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(format!("{context}: {e}"))
    } else if e.is_builder() {
        TransportError::InvalidRequest(format!("{context}: {e}"))
    } else {
        TransportError::Connect(format!("{context}: {e}"))
    }
}

impl TransportClient for HttpTransport {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .build(request)?
                .send()
                .await
                .map_err(|e| send_error("request failed", e))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| send_error("reading response body", e))?;

            if status.is_success() {
                debug!(
                    request_id = request.id(),
                    status = status.as_u16(),
                    bytes = body.len(),
                    "backend responded"
                );
                return Ok(ApiResponse::new(status, headers, body));
            }

            let error = classify_status(status, &String::from_utf8_lossy(&body));
            if error.is_auth_expired() {
                debug!(request_id = request.id(), "backend rejected session");
            } else {
                warn!(
                    request_id = request.id(),
                    status = status.as_u16(),
                    error = %error,
                    "backend returned error status"
                );
            }
            Err(error)
        })
    }
}
