//! HTTP client for the resume-analysis backend
//!
//! Every endpoint call is routed through `session::RequestCoordinator`, so an
//! expired session cookie is renewed once and the affected calls replayed
//! without the caller noticing. This crate supplies the two collaborators the
//! coordinator needs:
//! - `HttpTransport` executes descriptors with `reqwest` and classifies 401s
//! - `SessionRefresher` renews the session via `POST /auth/refresh`
//!
//! Both share one `reqwest::Client` with a cookie store: the refresh rotates
//! the session cookie and the replay picks it up from the jar.

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod refresh;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{ApiClient, ClientSettings};
pub use error::{Error, Result};
pub use models::{Analysis, ExperienceComparison, HistoryPage, User};
pub use refresh::SessionRefresher;
pub use transport::HttpTransport;
