//! Single-flight session refresh around every outbound request
//!
//! State is a single optional refresh episode holding the wait queue of its
//! followers. The leader/follower decision and the settlement both happen
//! inside one critical section of a `std::sync::Mutex` that is never held
//! across an await, so two near-simultaneous 401s cannot both become leaders.
//!
//! Per-request flow (no recursion, at most one replay):
//! 1. execute; anything but `AuthExpired` is returned as-is
//! 2. `AuthExpired` on a retried or refresh-exempt descriptor is final
//! 3. otherwise lead or join the episode, then replay once on success

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::descriptor::{ApiResponse, RequestDescriptor};
use crate::error::{Error, RefreshError, Result};
use crate::{CredentialRefresher, TransportClient, metrics};

/// Outcome delivered to every participant of an episode.
type Settlement = std::result::Result<(), RefreshError>;

/// A refresh in flight and the followers queued behind it.
struct Episode {
    number: u64,
    pending: Vec<oneshot::Sender<Settlement>>,
}

#[derive(Default)]
struct CoordinatorState {
    episode: Option<Episode>,
}

enum Role<'a> {
    Leader(EpisodeGuard<'a>),
    Follower {
        episode: u64,
        settled: oneshot::Receiver<Settlement>,
    },
}

/// Settles the leader's episode exactly once.
///
/// If the leader future is dropped mid-refresh, `Drop` settles the episode as
/// `Abandoned` so queued followers are released instead of waiting forever.
struct EpisodeGuard<'a> {
    coordinator: &'a RequestCoordinator,
    number: u64,
    settled: bool,
}

impl EpisodeGuard<'_> {
    fn settle(mut self, outcome: &Settlement) {
        self.settled = true;
        self.coordinator.settle(self.number, outcome);
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(episode = self.number, "refresh leader dropped before settling");
            self.coordinator
                .settle(self.number, &Err(RefreshError::Abandoned));
        }
    }
}

/// Wraps a transport so that expired sessions are renewed once and replayed.
pub struct RequestCoordinator {
    transport: Arc<dyn TransportClient>,
    refresher: Arc<dyn CredentialRefresher>,
    refresh_timeout: Option<Duration>,
    state: Mutex<CoordinatorState>,
    episodes_started: AtomicU64,
}

impl RequestCoordinator {
    pub fn new(
        transport: Arc<dyn TransportClient>,
        refresher: Arc<dyn CredentialRefresher>,
    ) -> Self {
        Self {
            transport,
            refresher,
            refresh_timeout: None,
            state: Mutex::new(CoordinatorState::default()),
            episodes_started: AtomicU64::new(0),
        }
    }

    /// Settle an episode as `TimedOut` if the refresher has not returned
    /// within `timeout`. Without this a stalled refresher stalls every
    /// request queued behind it.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Execute `request`, renewing the session and replaying once if the
    /// backend reports it expired.
    ///
    /// Returns the first response, the replay's outcome (whatever it is), or
    /// the shared refresh failure. Safe to call again from code that runs
    /// after a previous call returned.
    #[instrument(skip_all, fields(request_id = %request.id(), method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let expired = match self.transport.execute(&request).await {
            Ok(response) => return Ok(response),
            Err(e) if !e.is_auth_expired() => return Err(e.into()),
            Err(e) => e,
        };

        if request.is_retried() {
            metrics::record_retry_exhausted();
            warn!("session rejected on an already retried request, giving up");
            return Err(expired.into());
        }
        if request.is_refresh_exempt() {
            debug!("401 on a refresh-exempt request, returning it");
            return Err(expired.into());
        }

        let retry = request.into_retry();
        self.await_refresh().await?;

        metrics::record_replay();
        debug!("replaying request after session refresh");
        match self.transport.execute(&retry).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_auth_expired() => {
                metrics::record_retry_exhausted();
                warn!(error = %e, "session rejected again after refresh, giving up");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a refresh episode is currently alive.
    pub fn refresh_in_progress(&self) -> bool {
        self.lock_state().episode.is_some()
    }

    /// Number of followers queued behind the alive episode.
    pub fn waiting_requests(&self) -> usize {
        self.lock_state()
            .episode
            .as_ref()
            .map_or(0, |episode| episode.pending.len())
    }

    /// Total refresh episodes started by this coordinator.
    pub fn episodes_started(&self) -> u64 {
        self.episodes_started.load(Ordering::Relaxed)
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        // The critical sections never panic mid-update; a poisoned lock still
        // holds a consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the alive episode as a follower, or open a new one as its leader.
    fn join_or_lead(&self) -> Role<'_> {
        let mut state = self.lock_state();
        if let Some(episode) = state.episode.as_mut() {
            let (tx, rx) = oneshot::channel();
            episode.pending.push(tx);
            return Role::Follower {
                episode: episode.number,
                settled: rx,
            };
        }

        let number = self.episodes_started.fetch_add(1, Ordering::Relaxed) + 1;
        state.episode = Some(Episode {
            number,
            pending: Vec::new(),
        });
        Role::Leader(EpisodeGuard {
            coordinator: self,
            number,
            settled: false,
        })
    }

    async fn await_refresh(&self) -> Settlement {
        match self.join_or_lead() {
            Role::Follower { episode, settled } => {
                metrics::record_follower();
                debug!(episode, "refresh already in flight, waiting for it to settle");
                settled.await.unwrap_or(Err(RefreshError::Abandoned))
            }
            Role::Leader(guard) => {
                info!(episode = guard.number, "session expired, refreshing");
                let outcome = self.run_refresher().await;
                guard.settle(&outcome);
                outcome
            }
        }
    }

    async fn run_refresher(&self) -> Settlement {
        match self.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, self.refresher.refresh())
                .await
                .unwrap_or(Err(RefreshError::TimedOut(limit))),
            None => self.refresher.refresh().await,
        }
    }

    /// Tear down episode `number` and release its followers with `outcome`.
    fn settle(&self, number: u64, outcome: &Settlement) {
        let episode = self
            .lock_state()
            .episode
            .take_if(|episode| episode.number == number);
        let Some(episode) = episode else {
            return;
        };

        metrics::record_episode(outcome);
        let followers = episode.pending.len();
        match outcome {
            Ok(()) => info!(episode = number, followers, "session refreshed"),
            Err(e) => warn!(episode = number, followers, error = %e, "session refresh failed"),
        }

        for follower in episode.pending {
            // A follower that went away no longer needs its outcome.
            let _ = follower.send(outcome.clone());
        }
    }
}
