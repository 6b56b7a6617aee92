//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_guard_repository;
mod in_memory_payout_ledger;
mod in_memory_revenue_repository;
mod in_memory_role_repository;
mod in_memory_tenant_repository;
mod in_memory_treasury;
mod postgres_audit_repository;
mod postgres_guard_repository;
mod postgres_revenue_repository;
mod postgres_role_repository;
mod postgres_tenant_repository;
#[cfg(test)]
mod postgres_test_support;
mod postgres_treasury;
mod postgres_values;
mod simulated_tenant_runtime;
mod system_clock;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_guard_repository::InMemoryGuardRepository;
pub use in_memory_payout_ledger::{InMemoryPayoutLedger, Payout};
pub use in_memory_revenue_repository::InMemoryRevenueRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_tenant_repository::InMemoryTenantRepository;
pub use in_memory_treasury::InMemoryTreasury;
pub use postgres_audit_repository::{PostgresAuditRepository, StoredAuditEvent};
pub use postgres_guard_repository::PostgresGuardRepository;
pub use postgres_revenue_repository::PostgresRevenueRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use postgres_treasury::PostgresTreasury;
pub use simulated_tenant_runtime::SimulatedTenantRuntime;
pub use system_clock::SystemClock;
