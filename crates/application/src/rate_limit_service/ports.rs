use async_trait::async_trait;
use chrono::{DateTime, Utc};

use campusly_core::AppResult;
use campusly_domain::{RateLimitPolicy, RateLimitWindow};

/// Repository port for rate limit windows.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Admits one event for `key` under `policy` and stores the updated
    /// window. Reading, admitting and writing happen atomically per key.
    ///
    /// Fails with `RateLimited` and leaves the stored window unchanged when
    /// the event is refused.
    async fn record_event(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitWindow>;

    /// Removes windows whose last event is older than the given cutoff.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
