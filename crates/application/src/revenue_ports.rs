use async_trait::async_trait;
use campusly_core::{AppResult, TenantId};
use campusly_domain::{FeeStructure, RevenueLedger};

/// Repository port for the default and per-tenant fee schedules.
#[async_trait]
pub trait FeeScheduleRepository: Send + Sync {
    /// Returns the platform default, if one was stored.
    async fn find_default_structure(&self) -> AppResult<Option<FeeStructure>>;

    /// Stores the platform default.
    async fn save_default_structure(&self, structure: FeeStructure) -> AppResult<()>;

    /// Returns the tenant's override, if any.
    async fn find_custom_structure(&self, tenant_id: TenantId) -> AppResult<Option<FeeStructure>>;

    /// Stores or replaces a tenant override.
    async fn save_custom_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()>;

    /// Removes a tenant override. Returns `false` when none existed.
    async fn remove_custom_structure(&self, tenant_id: TenantId) -> AppResult<bool>;
}

/// Repository port for revenue ledgers with optimistic versioning.
#[async_trait]
pub trait RevenueLedgerRepository: Send + Sync {
    /// Loads a tenant's ledger.
    async fn find_ledger(&self, tenant_id: TenantId) -> AppResult<Option<RevenueLedger>>;

    /// Persists `ledger` if the stored version still equals
    /// `ledger.version()` (0 meaning not stored yet) and returns it at its
    /// new version. Fails with `Conflict` otherwise.
    async fn save_ledger(&self, ledger: &RevenueLedger) -> AppResult<RevenueLedger>;
}

/// Tenant instance that caches its resolved fee numbers.
#[async_trait]
pub trait FeeSyncTarget: Send + Sync {
    /// Pushes the resolved fee schedule to the tenant's instance.
    async fn push_fee_structure(&self, tenant_id: TenantId, structure: FeeStructure)
    -> AppResult<()>;
}
