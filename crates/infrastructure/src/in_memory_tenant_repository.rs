use std::collections::HashMap;

use async_trait::async_trait;
use campusly_application::TenantRepository;
use campusly_core::{AccountId, AppError, AppResult, TenantId};
use campusly_domain::TenantRecord;
use tokio::sync::RwLock;

/// In-memory tenant record store keyed by organization admin.
#[derive(Debug, Default)]
pub struct InMemoryTenantRepository {
    records: RwLock<HashMap<AccountId, TenantRecord>>,
}

impl InMemoryTenantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_organization(
        &self,
        organization_admin: AccountId,
    ) -> AppResult<Option<TenantRecord>> {
        Ok(self.records.read().await.get(&organization_admin).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.tenant_id() == tenant_id)
            .cloned())
    }

    async fn insert_if_absent(&self, record: TenantRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.organization_admin())
            || records
                .values()
                .any(|stored| stored.tenant_id() == record.tenant_id())
        {
            return Err(AppError::Conflict(format!(
                "organization '{}' already has a tenant",
                record.organization_admin()
            )));
        }

        records.insert(record.organization_admin(), record);
        Ok(())
    }

    async fn replace(&self, previous: &TenantRecord, next: TenantRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&previous.organization_admin()) {
            Some(stored) if stored == previous => {
                *stored = next;
                Ok(())
            }
            _ => Err(AppError::Conflict(format!(
                "tenant '{}' was modified concurrently",
                previous.tenant_id()
            ))),
        }
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        let mut records: Vec<TenantRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by_key(TenantRecord::provisioned_at);
        Ok(records)
    }
}
