//! Revenue splitting, fee schedules and tenant withdrawals.

use std::sync::Arc;

use campusly_core::{AccountId, AppError, AppResult, ProgramId, TenantId};
use campusly_domain::{FeeFields, FeeStructure, Role, RoleScope};
use chrono::Duration;

use crate::{
    AuditRepository, Clock, FeeScheduleRepository, FeeSyncTarget, FundsTransfer, PlatformTreasury,
    RevenueLedgerRepository, RoleRegistry, TenantRepository,
};

mod fees;
mod payments;

/// Ports the revenue account reads and writes.
#[derive(Clone)]
pub struct RevenueAccountPorts {
    /// Default and per-tenant fee schedules.
    pub fee_schedules: Arc<dyn FeeScheduleRepository>,
    /// Versioned revenue ledgers.
    pub ledgers: Arc<dyn RevenueLedgerRepository>,
    /// Authoritative tenant records.
    pub tenants: Arc<dyn TenantRepository>,
    /// Platform funds.
    pub treasury: Arc<dyn PlatformTreasury>,
    /// Outbound transfers for tenant withdrawals.
    pub funds_transfer: Arc<dyn FundsTransfer>,
    /// Tenant instances caching their fee numbers.
    pub fee_sync: Arc<dyn FeeSyncTarget>,
    /// Audit log.
    pub audit: Arc<dyn AuditRepository>,
}

/// Payment routed through the revenue split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentInput {
    /// Tenant receiving the payment.
    pub tenant_id: TenantId,
    /// Account the payment originates from.
    pub payer: AccountId,
    /// Program the revenue is attributed to.
    pub program_id: ProgramId,
    /// Declared amount. Must equal the attached value.
    pub amount: u64,
}

/// Result of pushing fee numbers to a tenant instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeSyncOutcome {
    /// The instance now caches the pushed schedule.
    Synced(FeeStructure),
    /// The push failed; the instance keeps its previous numbers.
    Failed {
        /// Failure reported by the instance.
        reason: String,
    },
}

/// Revenue accounting shared by every tenant.
#[derive(Clone)]
pub struct RevenueAccount {
    ports: RevenueAccountPorts,
    role_registry: RoleRegistry,
    clock: Arc<dyn Clock>,
    default_fees: FeeFields,
    withdrawal_cooldown: Duration,
}

impl RevenueAccount {
    /// Creates the revenue account. `default_fees` applies until an operator
    /// stores a different default.
    #[must_use]
    pub fn new(
        ports: RevenueAccountPorts,
        role_registry: RoleRegistry,
        clock: Arc<dyn Clock>,
        default_fees: FeeFields,
        withdrawal_cooldown: Duration,
    ) -> Self {
        Self {
            ports,
            role_registry,
            clock,
            default_fees,
            withdrawal_cooldown,
        }
    }

    /// Returns the shared role registry.
    #[must_use]
    pub fn role_registry(&self) -> &RoleRegistry {
        &self.role_registry
    }

    async fn require_tenant_administrator(
        &self,
        caller: AccountId,
        tenant_id: TenantId,
    ) -> AppResult<()> {
        if caller == tenant_id.as_account()
            || self
                .role_registry
                .check(Role::Admin, caller, RoleScope::Tenant(tenant_id))
                .await?
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "account '{caller}' may not manage revenue of tenant '{tenant_id}'"
        )))
    }
}
