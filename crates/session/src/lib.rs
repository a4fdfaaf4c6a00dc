//! Session-aware request coordination
//!
//! Wraps every outbound API call so that an expired session is renewed exactly
//! once, no matter how many requests discover the expiry at the same time.
//! The first request to see a 401 leads a refresh episode; requests failing
//! while the episode is alive queue behind it as followers. When the refresh
//! settles, every participant either replays its own request once or fails
//! with the same refresh error.
//!
//! The network is reached only through two seams:
//! - `TransportClient` executes a `RequestDescriptor` and classifies the result
//! - `CredentialRefresher` renews the session
//!
//! Both return `Pin<Box<dyn Future>>` so they can be held as `Arc<dyn _>`.

pub mod coordinator;
pub mod descriptor;
pub mod error;
mod metrics;

pub use coordinator::RequestCoordinator;
pub use descriptor::{ApiResponse, FormPart, RequestBody, RequestDescriptor};
pub use error::{Error, RefreshError, Result, TransportError};

use std::future::Future;
use std::pin::Pin;

/// Executes requests against the backend.
///
/// Implementations must report an expired session as
/// `TransportError::AuthExpired` and every other failure as some other
/// variant; the coordinator only intercepts the former.
pub trait TransportClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<ApiResponse, TransportError>> + Send + 'a>>;
}

/// Renews the caller's session credential.
///
/// Called at most once per refresh episode. Must not route through the
/// coordinator itself.
pub trait CredentialRefresher: Send + Sync {
    fn refresh(
        &self,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), RefreshError>> + Send + '_>>;
}
