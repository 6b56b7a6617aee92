use std::sync::Arc;

use campusly_application::{
    AccountDirectory, AuditRepository, FeeScheduleRepository, FeeSyncTarget, FundsTransfer,
    InstanceProvisioner, InstanceStatusRepository, PlatformTreasury, RateLimitRepository,
    RevenueLedgerRepository, RoleRepository, TenantProfileService, TenantRepository,
};
use campusly_infrastructure::{
    InMemoryAuditRepository, InMemoryGuardRepository, InMemoryPayoutLedger,
    InMemoryRevenueRepository, InMemoryRoleRepository, InMemoryTenantRepository, InMemoryTreasury,
    PostgresAuditRepository, PostgresGuardRepository, PostgresRevenueRepository,
    PostgresRoleRepository, PostgresTenantRepository, PostgresTreasury, SimulatedTenantRuntime,
};
use sqlx::PgPool;

/// Every port implementation the services are wired with.
pub(super) struct RepositorySet {
    pub roles: Arc<dyn RoleRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub fee_schedules: Arc<dyn FeeScheduleRepository>,
    pub ledgers: Arc<dyn RevenueLedgerRepository>,
    pub treasury: Arc<dyn PlatformTreasury>,
    pub statuses: Arc<dyn InstanceStatusRepository>,
    pub rate_limits: Arc<dyn RateLimitRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub instances: Arc<dyn InstanceProvisioner>,
    pub fee_sync: Arc<dyn FeeSyncTarget>,
    pub profiles: Arc<dyn TenantProfileService>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub funds_transfer: Arc<dyn FundsTransfer>,
}

pub(super) fn build_postgres_repository_set(pool: &PgPool) -> RepositorySet {
    let revenue = Arc::new(PostgresRevenueRepository::new(pool.clone()));
    let guard = Arc::new(PostgresGuardRepository::new(pool.clone()));

    with_simulated_runtime(
        Arc::new(PostgresRoleRepository::new(pool.clone())),
        Arc::new(PostgresTenantRepository::new(pool.clone())),
        revenue.clone(),
        revenue,
        Arc::new(PostgresTreasury::new(pool.clone())),
        guard.clone(),
        guard,
        Arc::new(PostgresAuditRepository::new(pool.clone())),
    )
}

pub(super) fn build_in_memory_repository_set() -> RepositorySet {
    let revenue = Arc::new(InMemoryRevenueRepository::new());
    let guard = Arc::new(InMemoryGuardRepository::new());

    with_simulated_runtime(
        Arc::new(InMemoryRoleRepository::new()),
        Arc::new(InMemoryTenantRepository::new()),
        revenue.clone(),
        revenue,
        Arc::new(InMemoryTreasury::new()),
        guard.clone(),
        guard,
        Arc::new(InMemoryAuditRepository::new()),
    )
}

#[allow(clippy::too_many_arguments)]
fn with_simulated_runtime(
    roles: Arc<dyn RoleRepository>,
    tenants: Arc<dyn TenantRepository>,
    fee_schedules: Arc<dyn FeeScheduleRepository>,
    ledgers: Arc<dyn RevenueLedgerRepository>,
    treasury: Arc<dyn PlatformTreasury>,
    statuses: Arc<dyn InstanceStatusRepository>,
    rate_limits: Arc<dyn RateLimitRepository>,
    audit: Arc<dyn AuditRepository>,
) -> RepositorySet {
    let runtime = Arc::new(SimulatedTenantRuntime::new());

    RepositorySet {
        roles,
        tenants,
        fee_schedules,
        ledgers,
        treasury,
        statuses,
        rate_limits,
        audit,
        instances: runtime.clone(),
        fee_sync: runtime.clone(),
        profiles: runtime.clone(),
        accounts: runtime,
        funds_transfer: Arc::new(InMemoryPayoutLedger::new()),
    }
}
