use std::collections::HashMap;

use async_trait::async_trait;
use campusly_application::{InstanceStatusRepository, RateLimitRepository};
use campusly_core::{AppResult, TenantId};
use campusly_domain::{InstanceStatus, RateLimitPolicy, RateLimitWindow};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// In-memory kill switch states and rate limit windows.
#[derive(Debug, Default)]
pub struct InMemoryGuardRepository {
    statuses: Mutex<HashMap<TenantId, InstanceStatus>>,
    windows: Mutex<HashMap<String, RateLimitWindow>>,
}

impl InMemoryGuardRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStatusRepository for InMemoryGuardRepository {
    async fn find_status(&self, tenant_id: TenantId) -> AppResult<InstanceStatus> {
        Ok(self
            .statuses
            .lock()
            .await
            .get(&tenant_id)
            .copied()
            .unwrap_or_default())
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        expected: InstanceStatus,
        next: InstanceStatus,
    ) -> AppResult<bool> {
        let mut statuses = self.statuses.lock().await;
        let current = statuses.entry(tenant_id).or_default();
        if *current != expected {
            return Ok(false);
        }

        *current = next;
        Ok(true)
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryGuardRepository {
    async fn record_event(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitWindow> {
        let mut windows = self.windows.lock().await;
        let mut window = windows.get(key).copied().unwrap_or_default();
        window.admit(policy, now)?;
        windows.insert(key.to_owned(), window);

        Ok(window)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let initial = windows.len();
        windows.retain(|_, window| {
            window
                .last_event_at
                .is_some_and(|last_event_at| last_event_at >= before)
        });

        Ok(u64::try_from(initial - windows.len()).unwrap_or(u64::MAX))
    }
}
