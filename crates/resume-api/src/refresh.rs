//! Session renewal against the backend's refresh endpoint
//!
//! `POST {base_url}/auth/refresh` rotates the session cookie held in the
//! shared client's cookie jar. The call goes straight to `reqwest`, never
//! through the coordinator: a refresh that itself triggered a refresh would
//! deadlock the episode it belongs to.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use session::{CredentialRefresher, RefreshError};
use tracing::debug;

use crate::constants::REFRESH_PATH;

/// Renews the session cookie for a `reqwest::Client` shared with `HttpTransport`.
pub struct SessionRefresher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SessionRefresher {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CredentialRefresher for SessionRefresher {
    fn refresh(&self) -> Pin<Box<dyn Future<Output = Result<(), RefreshError>> + Send + '_>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| RefreshError::Failed(format!("refresh request failed: {e}")))?;

            let status = response.status();
            if status.is_success() {
                debug!(status = status.as_u16(), "refresh accepted");
                return Ok(());
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            // 401/403 means the refresh credential itself is gone or revoked
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(RefreshError::Rejected(format!(
                    "refresh rejected ({status}): {body}"
                )));
            }

            Err(RefreshError::Failed(format!(
                "refresh returned {status}: {body}"
            )))
        })
    }
}
