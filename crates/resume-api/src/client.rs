//! Session-aware API client
//!
//! `ApiClient` owns the coordinator and exposes one method per backend
//! endpoint. It also tracks the signed-in user: set by `login`, renewed or
//! cleared by `refresh_user`, always cleared by `logout`.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use session::{FormPart, RequestCoordinator, RequestDescriptor};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::constants::{
    ANALYSIS_PATH, ANALYZE_PATH, ANALYZE_TIMEOUT, CHANGE_PASSWORD_PATH, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT, HISTORY_PATH, JOB_DESCRIPTION_FIELD, LOGIN_PATH, LOGOUT_ALL_PATH,
    LOGOUT_PATH, ME_PATH, REFRESH_PATH, REGISTER_PATH, RESUME_FIELD, UPDATE_NAME_PATH,
};
use crate::error::{Error, Result};
use crate::models::{
    Acknowledgement, Analysis, ChangePasswordRequest, Envelope, HistoryPage, LoginRequest,
    RegisterRequest, UpdateNameRequest, User,
};
use crate::refresh::SessionRefresher;
use crate::transport::HttpTransport;

/// Connection settings for `ApiClient::connect`.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub analyze_timeout: Duration,
    /// Upper bound on one refresh episode; `None` waits for the refresher.
    pub refresh_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            analyze_timeout: ANALYZE_TIMEOUT,
            refresh_timeout: None,
        }
    }
}

pub struct ApiClient {
    coordinator: Arc<RequestCoordinator>,
    current_user: RwLock<Option<User>>,
    analyze_timeout: Duration,
}

impl ApiClient {
    /// Build the HTTP stack: one cookie-holding `reqwest::Client` shared by
    /// the transport and the refresher, wrapped in a `RequestCoordinator`.
    pub fn connect(settings: &ClientSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        let transport = Arc::new(HttpTransport::new(
            http.clone(),
            settings.base_url.clone(),
            settings.timeout,
        ));
        let refresher = Arc::new(SessionRefresher::new(
            http,
            &settings.base_url,
            settings.timeout,
        ));

        let mut coordinator = RequestCoordinator::new(transport, refresher);
        if let Some(timeout) = settings.refresh_timeout {
            coordinator = coordinator.with_refresh_timeout(timeout);
        }

        let mut client = Self::new(Arc::new(coordinator));
        client.analyze_timeout = settings.analyze_timeout;
        Ok(client)
    }

    pub fn new(coordinator: Arc<RequestCoordinator>) -> Self {
        Self {
            coordinator,
            current_user: RwLock::new(None),
            analyze_timeout: ANALYZE_TIMEOUT,
        }
    }

    pub fn coordinator(&self) -> &Arc<RequestCoordinator> {
        &self.coordinator
    }

    // -- auth --

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = with_json(
            RequestDescriptor::post(LOGIN_PATH).exempt_from_refresh(),
            &LoginRequest { email, password },
        )?;
        let user: User = self.call(request).await?;
        info!(user_id = %user.id, "signed in");
        *self.current_user.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> Result<User> {
        let request = with_json(
            RequestDescriptor::post(REGISTER_PATH).exempt_from_refresh(),
            &RegisterRequest {
                full_name,
                email,
                password,
            },
        )?;
        self.call(request).await
    }

    /// End the session. Never fails: a backend error is logged and the cached
    /// user is cleared regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.acknowledge(RequestDescriptor::post(LOGOUT_PATH)).await {
            warn!(error = %e, "logout request failed, clearing local session anyway");
        }
        *self.current_user.write().await = None;
    }

    /// Revoke every session of the account, this one included.
    pub async fn logout_all(&self) -> Result<()> {
        self.acknowledge(RequestDescriptor::post(LOGOUT_ALL_PATH))
            .await?;
        *self.current_user.write().await = None;
        Ok(())
    }

    /// Explicitly renew the session cookie. A 401 here is final.
    pub async fn refresh(&self) -> Result<()> {
        self.acknowledge(RequestDescriptor::post(REFRESH_PATH).exempt_from_refresh())
            .await
    }

    // -- users --

    pub async fn me(&self) -> Result<User> {
        self.call(RequestDescriptor::get(ME_PATH)).await
    }

    /// Re-fetch the signed-in user. On any failure the cached user is cleared.
    pub async fn refresh_user(&self) -> Result<User> {
        let fetched = self.me().await;
        let mut current = self.current_user.write().await;
        match fetched {
            Ok(user) => {
                *current = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                debug!(error = %e, "could not load current user");
                *current = None;
                Err(e)
            }
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current_user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_user.read().await.is_some()
    }

    /// Rename the account and return the re-fetched user.
    pub async fn update_name(&self, full_name: &str) -> Result<User> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(Error::InvalidInput("full name must not be empty".into()));
        }
        let request = with_json(
            RequestDescriptor::patch(UPDATE_NAME_PATH),
            &UpdateNameRequest { full_name },
        )?;
        self.acknowledge(request).await?;
        self.refresh_user().await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::InvalidInput("new password must not be empty".into()));
        }
        if new_password != confirm_new_password {
            return Err(Error::InvalidInput(
                "new password and confirmation do not match".into(),
            ));
        }
        let request = with_json(
            RequestDescriptor::patch(CHANGE_PASSWORD_PATH),
            &ChangePasswordRequest {
                current_password,
                new_password,
                confirm_new_password,
            },
        )?;
        self.acknowledge(request).await
    }

    // -- analysis --

    /// Upload a resume with the job description it should be scored against.
    pub async fn analyze(
        &self,
        file_name: &str,
        resume: impl Into<Bytes>,
        job_description: &str,
    ) -> Result<Analysis> {
        let resume = resume.into();
        if resume.is_empty() {
            return Err(Error::InvalidInput(format!("resume file {file_name} is empty")));
        }
        if job_description.trim().is_empty() {
            return Err(Error::InvalidInput("job description must not be blank".into()));
        }

        let request = RequestDescriptor::post(ANALYZE_PATH)
            .with_multipart(vec![
                FormPart::file(
                    RESUME_FIELD,
                    file_name,
                    content_type_for(file_name).map(str::to_owned),
                    resume,
                ),
                FormPart::text(JOB_DESCRIPTION_FIELD, job_description),
            ])
            .with_timeout(self.analyze_timeout);

        let analysis: Analysis = self.call(request).await?;
        Ok(analysis.normalize())
    }

    pub async fn history(&self, page: u32, limit: u32) -> Result<HistoryPage> {
        if page == 0 || limit == 0 {
            return Err(Error::InvalidInput(format!(
                "page and limit start at 1 (got page={page}, limit={limit})"
            )));
        }
        let request = RequestDescriptor::get(HISTORY_PATH)
            .with_query("page", page)
            .with_query("limit", limit);
        self.call(request).await
    }

    pub async fn delete_analysis(&self, id: &str) -> Result<()> {
        if id.is_empty() || id.contains('/') || id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!("invalid analysis id {id:?}")));
        }
        self.acknowledge(RequestDescriptor::delete(format!("{ANALYSIS_PATH}/{id}")))
            .await
    }

    // -- plumbing --

    /// Send through the coordinator and unwrap the envelope's `data`.
    async fn call<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let path = request.path().to_owned();
        let response = self.coordinator.send(request).await?;
        let envelope: Envelope<T> = response.json().map_err(|e| Error::Decode {
            path,
            reason: e.to_string(),
        })?;
        Ok(envelope.data)
    }

    /// Send a call whose response carries no `data`.
    async fn acknowledge(&self, request: RequestDescriptor) -> Result<()> {
        let path = request.path().to_owned();
        let response = self.coordinator.send(request).await?;
        if response.body.is_empty() {
            return Ok(());
        }
        let ack: Acknowledgement = response.json().map_err(|e| Error::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %path, message = ack.message.as_deref().unwrap_or(""), "acknowledged");
        Ok(())
    }
}

fn with_json<T: Serialize>(request: RequestDescriptor, body: &T) -> Result<RequestDescriptor> {
    let path = request.path().to_owned();
    request
        .with_json(body)
        .map_err(|e| Error::InvalidInput(format!("encoding body for {path}: {e}")))
}

/// Content type the backend's upload filter accepts for a resume file name.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "doc" => Some("application/msword"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
