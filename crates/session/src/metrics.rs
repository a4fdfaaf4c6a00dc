//! Coordinator counters
//!
//! - `session_refresh_episodes_total` (counter): label `outcome`
//! - `session_refresh_followers_total` (counter)
//! - `session_requests_replayed_total` (counter)
//! - `session_retry_exhausted_total` (counter)
//!
//! Without an installed recorder these calls are no-ops.

use crate::error::RefreshError;

pub(crate) fn record_episode(outcome: &Result<(), RefreshError>) {
    let label = match outcome {
        Ok(()) => "success",
        Err(e) => e.outcome_label(),
    };
    metrics::counter!("session_refresh_episodes_total", "outcome" => label).increment(1);
}

pub(crate) fn record_follower() {
    metrics::counter!("session_refresh_followers_total").increment(1);
}

pub(crate) fn record_replay() {
    metrics::counter!("session_requests_replayed_total").increment(1);
}

pub(crate) fn record_retry_exhausted() {
    metrics::counter!("session_retry_exhausted_total").increment(1);
}
