use std::sync::Arc;

use campusly_application::{
    Clock, FeeCollectionService, RateLimitService, RevenueAccount, RevenueAccountPorts,
    RoleRegistry, TenantFactory, TenantFactoryPorts, TenantGatePorts,
};
use campusly_core::{AppError, CallContext};
use campusly_domain::Role;
use campusly_infrastructure::SystemClock;
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod repositories;

use repositories::{RepositorySet, build_in_memory_repository_set, build_postgres_repository_set};

/// Wires the services over PostgreSQL when a pool is given, in memory
/// otherwise, and seeds the platform roles.
pub async fn build_app_state(
    pool: Option<&PgPool>,
    config: &ApiConfig,
) -> Result<AppState, AppError> {
    let repositories =
        pool.map_or_else(build_in_memory_repository_set, build_postgres_repository_set);

    wire_services(repositories, config, Arc::new(SystemClock)).await
}

async fn wire_services(
    repositories: RepositorySet,
    config: &ApiConfig,
    clock: Arc<dyn Clock>,
) -> Result<AppState, AppError> {
    let settings = config.settings.clone();
    let role_registry = RoleRegistry::new(repositories.roles, repositories.audit.clone());

    let revenue_account = RevenueAccount::new(
        RevenueAccountPorts {
            fee_schedules: repositories.fee_schedules,
            ledgers: repositories.ledgers,
            tenants: repositories.tenants.clone(),
            treasury: repositories.treasury.clone(),
            funds_transfer: repositories.funds_transfer.clone(),
            fee_sync: repositories.fee_sync,
            audit: repositories.audit.clone(),
        },
        role_registry.clone(),
        clock.clone(),
        settings.default_fees,
        settings.withdrawal_cooldown,
    );

    let tenant_factory = TenantFactory::new(
        TenantFactoryPorts {
            tenants: repositories.tenants.clone(),
            instances: repositories.instances,
            profiles: repositories.profiles,
            accounts: repositories.accounts,
            treasury: repositories.treasury,
            funds_transfer: repositories.funds_transfer,
            audit: repositories.audit.clone(),
        },
        role_registry.clone(),
        revenue_account.clone(),
        clock.clone(),
        settings.clone(),
    );

    if role_registry
        .bootstrap_master(settings.master_account)
        .await?
    {
        info!(master = %settings.master_account, "seeded platform master");
    }
    role_registry
        .grant_global(
            &CallContext::unpaid(settings.master_account),
            Role::Admin,
            settings.factory_account,
        )
        .await?;

    Ok(AppState {
        fee_collection: FeeCollectionService::new(
            revenue_account.clone(),
            settings.collection_rate_limit,
        ),
        rate_limit_service: RateLimitService::new(repositories.rate_limits, clock.clone()),
        gate_ports: TenantGatePorts {
            tenants: repositories.tenants,
            statuses: repositories.statuses,
            audit: repositories.audit,
        },
        role_registry,
        revenue_account,
        tenant_factory,
        clock,
    })
}

#[cfg(test)]
pub(crate) async fn build_test_state(config: &ApiConfig) -> AppState {
    wire_services(build_in_memory_repository_set(), config, Arc::new(SystemClock))
        .await
        .unwrap_or_else(|error| panic!("failed to wire test state: {error}"))
}
