use std::collections::HashMap;

use async_trait::async_trait;
use campusly_application::{FeeScheduleRepository, RevenueLedgerRepository};
use campusly_core::{AppError, AppResult, TenantId};
use campusly_domain::{FeeStructure, RevenueLedger};
use tokio::sync::RwLock;

/// In-memory fee schedules and revenue ledgers.
#[derive(Debug, Default)]
pub struct InMemoryRevenueRepository {
    default_structure: RwLock<Option<FeeStructure>>,
    custom_structures: RwLock<HashMap<TenantId, FeeStructure>>,
    ledgers: RwLock<HashMap<TenantId, RevenueLedger>>,
}

impl InMemoryRevenueRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeScheduleRepository for InMemoryRevenueRepository {
    async fn find_default_structure(&self) -> AppResult<Option<FeeStructure>> {
        Ok(*self.default_structure.read().await)
    }

    async fn save_default_structure(&self, structure: FeeStructure) -> AppResult<()> {
        *self.default_structure.write().await = Some(structure);
        Ok(())
    }

    async fn find_custom_structure(&self, tenant_id: TenantId) -> AppResult<Option<FeeStructure>> {
        Ok(self.custom_structures.read().await.get(&tenant_id).copied())
    }

    async fn save_custom_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()> {
        self.custom_structures
            .write()
            .await
            .insert(tenant_id, structure);
        Ok(())
    }

    async fn remove_custom_structure(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self
            .custom_structures
            .write()
            .await
            .remove(&tenant_id)
            .is_some())
    }
}

#[async_trait]
impl RevenueLedgerRepository for InMemoryRevenueRepository {
    async fn find_ledger(&self, tenant_id: TenantId) -> AppResult<Option<RevenueLedger>> {
        Ok(self.ledgers.read().await.get(&tenant_id).cloned())
    }

    async fn save_ledger(&self, ledger: &RevenueLedger) -> AppResult<RevenueLedger> {
        let mut ledgers = self.ledgers.write().await;
        let stored_version = ledgers
            .get(&ledger.tenant_id())
            .map_or(0, RevenueLedger::version);

        if stored_version != ledger.version() {
            return Err(AppError::Conflict(format!(
                "revenue ledger of tenant '{}' is at version {stored_version}, expected {}",
                ledger.tenant_id(),
                ledger.version()
            )));
        }

        let saved = RevenueLedger::restore(
            ledger.tenant_id(),
            ledger.total_revenue(),
            ledger.platform_share_accrued(),
            ledger.tenant_share_accrued(),
            ledger.last_withdrawal_time(),
            ledger.programs().clone(),
            ledger.next_version(),
        );
        ledgers.insert(ledger.tenant_id(), saved.clone());

        Ok(saved)
    }
}
