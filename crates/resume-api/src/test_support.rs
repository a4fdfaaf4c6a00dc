//! In-process mock of the resume-analysis backend for client tests.
//!
//! Sessions are cookies: `session` authorizes API calls, `refresh` renews
//! `session` at `/auth/refresh`. `expire()` invalidates the current session
//! without telling the client, the way a short-lived access token lapses.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct";

#[derive(Default)]
pub struct MockState {
    session: Mutex<Option<String>>,
    refresh_token: Mutex<Option<String>>,
    full_name: Mutex<String>,
    refresh_delay: Mutex<Duration>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    refresh_fails: AtomicBool,
    logout_fails: AtomicBool,
}

impl MockState {
    fn issue(&self) -> usize {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let session = self.session.lock().unwrap().clone();
        session.is_some() && cookie(headers, "session") == session
    }

    fn user(&self) -> Value {
        json!({
            "_id": "u1",
            "fullName": *self.full_name.lock().unwrap(),
            "email": EMAIL,
            "createdAt": "2024-01-01T00:00:00.000Z"
        })
    }
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Invalidate the current session cookie; the refresh cookie stays valid.
    pub fn expire(&self) {
        *self.state.session.lock().unwrap() = None;
    }

    pub fn fail_refresh(&self) {
        self.state.refresh_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_logout(&self) {
        self.state.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn delay_refresh(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.state.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_owned)
        })
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

fn expired() -> Response {
    failure(StatusCode::UNAUTHORIZED, "Access token expired")
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let n = state.issue();
    *state.session.lock().unwrap() = Some(format!("tok-{n}"));
    *state.refresh_token.lock().unwrap() = Some(format!("rt-{n}"));
    (
        AppendHeaders([
            (header::SET_COOKIE, format!("session=tok-{n}; Path=/; HttpOnly")),
            (header::SET_COOKIE, format!("refresh=rt-{n}; Path=/; HttpOnly")),
        ]),
        Json(json!({"success": true, "message": "Logged in", "data": state.user()})),
    )
        .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == EMAIL {
        return failure(StatusCode::CONFLICT, "User already exists");
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {"_id": "u2", "fullName": body["fullName"], "email": body["email"]}
        })),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let expected = state.refresh_token.lock().unwrap().clone();
    if state.refresh_fails.load(Ordering::SeqCst)
        || expected.is_none()
        || cookie(&headers, "refresh") != expected
    {
        return failure(StatusCode::UNAUTHORIZED, "Refresh token expired");
    }

    let n = state.issue();
    *state.session.lock().unwrap() = Some(format!("tok-{n}"));
    (
        AppendHeaders([(header::SET_COOKIE, format!("session=tok-{n}; Path=/; HttpOnly"))]),
        Json(json!({"success": true, "message": "Token refreshed"})),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Logout failed");
    }
    if !state.authorized(&headers) {
        return expired();
    }
    *state.session.lock().unwrap() = None;
    *state.refresh_token.lock().unwrap() = None;
    Json(json!({"success": true, "message": "Logged out"})).into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    Json(json!({"success": true, "data": state.user()})).into_response()
}

async fn update_name(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    let Some(name) = body["fullName"].as_str() else {
        return failure(StatusCode::BAD_REQUEST, "fullName is required");
    };
    *state.full_name.lock().unwrap() = name.to_owned();
    Json(json!({"success": true, "message": "Name updated"})).into_response()
}

async fn change_password(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    if body["currentPassword"] != PASSWORD {
        return failure(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    Json(json!({"success": true, "message": "Password changed"})).into_response()
}

async fn analyze(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    state.analyze_calls.fetch_add(1, Ordering::SeqCst);

    let mut resume = None;
    let mut job_description = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.unwrap_or_default();
                resume = Some((file_name, content_type, bytes.len()));
            }
            Some("jobDescription") => {
                job_description = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (Some((file_name, content_type, size)), Some(job_description)) = (resume, job_description)
    else {
        return failure(StatusCode::BAD_REQUEST, "Resume and job description are required");
    };

    Json(json!({
        "success": true,
        "data": {
            "atsScore": 78,
            "jdExperience": {"min": 3, "max": 5, "level": "mid"},
            "candidateExperience": {"years": 4, "level": "mid"},
            "breakdown": {"skills": {"matched": ["rust", "tokio"], "missing": ["kubernetes"]}},
            "upload": {
                "fileName": file_name,
                "contentType": content_type,
                "size": size,
                "jobDescription": job_description
            }
        }
    }))
    .into_response()
}

async fn history(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: u32 = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let total = 3u32;
    let results: Vec<Value> = (1..=total)
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .map(|i| {
            json!({
                "_id": format!("a{i}"),
                "atsScore": 50 + i,
                "experience": {"jd": {"min": i}, "candidate": {"years": i}}
            })
        })
        .collect();
    Json(json!({
        "success": true,
        "data": {
            "results": results,
            "page": page,
            "limit": limit,
            "totalResults": total,
            "totalPages": total.div_ceil(limit)
        }
    }))
    .into_response()
}

async fn delete_analysis(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !state.authorized(&headers) {
        return expired();
    }
    if id == "missing" {
        return failure(StatusCode::NOT_FOUND, "Analysis not found");
    }
    Json(json!({"success": true, "message": "Analysis deleted"})).into_response()
}

/// Start the mock backend on an ephemeral port. `base_url` ends in `/api/v1`.
pub async fn start_mock_backend() -> MockBackend {
    let state = Arc::new(MockState::default());
    *state.full_name.lock().unwrap() = String::from("Ada Lovelace");

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout))
        .route("/users/me", get(me))
        .route("/users/update-name", patch(update_name))
        .route("/users/change-password", patch(change_password))
        .route("/resume/analyze", post(analyze))
        .route("/analysis/history", get(history))
        .route("/analysis/{id}", delete(delete_analysis))
        .with_state(state.clone());
    let app = Router::new().nest("/api/v1", api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{addr}/api/v1"),
        state,
    }
}
