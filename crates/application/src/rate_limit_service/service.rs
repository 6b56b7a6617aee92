use std::sync::Arc;

use campusly_core::{AccountId, AppResult};
use campusly_domain::RateLimitWindow;
use chrono::Duration;
use tracing::debug;

use crate::Clock;

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    clock: Arc<dyn Clock>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Records one event for `caller` under `rule`.
    ///
    /// Returns the updated window when the event is admitted, or
    /// `Err(AppError::RateLimited)` inside the cooldown or once the burst
    /// limit of the current window is reached.
    pub async fn check_rate_limit(
        &self,
        rule: &RateLimitRule,
        caller: AccountId,
    ) -> AppResult<RateLimitWindow> {
        let composite_key = format!("{}:{caller}", rule.category);
        let window = self
            .repository
            .record_event(&composite_key, &rule.policy, self.clock.now())
            .await?;

        debug!(key = %composite_key, count = window.count, "rate limited event admitted");
        Ok(window)
    }

    /// Removes windows idle for longer than `retention`. Intended for
    /// periodic cleanup.
    pub async fn cleanup(&self, retention: Duration) -> AppResult<u64> {
        let cutoff = self.clock.now() - retention;
        self.repository.cleanup_expired(cutoff).await
    }
}
