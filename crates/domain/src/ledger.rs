use std::collections::BTreeMap;

use campusly_core::{AppError, AppResult, ProgramId, TenantId};
use chrono::{DateTime, Duration, Utc};

use crate::RevenueSplit;

/// Accrued revenue of one tenant, with per-program attribution.
///
/// `version` increases with every persisted mutation and is used by
/// repositories for optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueLedger {
    tenant_id: TenantId,
    total_revenue: u64,
    platform_share_accrued: u64,
    tenant_share_accrued: u64,
    last_withdrawal_time: Option<DateTime<Utc>>,
    programs: BTreeMap<ProgramId, u64>,
    version: u64,
}

/// Values taken out of a ledger by a withdrawal, kept to undo it when the
/// transfer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantShareWithdrawal {
    /// Amount zeroed out of the accrued tenant share.
    pub amount: u64,
    /// Withdrawal time before this withdrawal.
    pub previous_withdrawal_time: Option<DateTime<Utc>>,
}

impl RevenueLedger {
    /// Creates the empty ledger a tenant gets on its first payment.
    #[must_use]
    pub fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            total_revenue: 0,
            platform_share_accrued: 0,
            tenant_share_accrued: 0,
            last_withdrawal_time: None,
            programs: BTreeMap::new(),
            version: 0,
        }
    }

    /// Rehydrates a stored ledger.
    #[must_use]
    pub fn restore(
        tenant_id: TenantId,
        total_revenue: u64,
        platform_share_accrued: u64,
        tenant_share_accrued: u64,
        last_withdrawal_time: Option<DateTime<Utc>>,
        programs: BTreeMap<ProgramId, u64>,
        version: u64,
    ) -> Self {
        Self {
            tenant_id,
            total_revenue,
            platform_share_accrued,
            tenant_share_accrued,
            last_withdrawal_time,
            programs,
            version,
        }
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the sum of all processed payments.
    #[must_use]
    pub fn total_revenue(&self) -> u64 {
        self.total_revenue
    }

    /// Returns the platform share accrued over the ledger's lifetime.
    #[must_use]
    pub fn platform_share_accrued(&self) -> u64 {
        self.platform_share_accrued
    }

    /// Returns the tenant share not yet withdrawn.
    #[must_use]
    pub fn tenant_share_accrued(&self) -> u64 {
        self.tenant_share_accrued
    }

    /// Returns the time of the last withdrawal.
    #[must_use]
    pub fn last_withdrawal_time(&self) -> Option<DateTime<Utc>> {
        self.last_withdrawal_time
    }

    /// Returns the per-program revenue map.
    #[must_use]
    pub fn programs(&self) -> &BTreeMap<ProgramId, u64> {
        &self.programs
    }

    /// Returns revenue attributed to one program.
    #[must_use]
    pub fn program_revenue(&self, program_id: ProgramId) -> u64 {
        self.programs.get(&program_id).copied().unwrap_or(0)
    }

    /// Returns the persisted version this ledger was loaded at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the version the next save writes.
    #[must_use]
    pub fn next_version(&self) -> u64 {
        self.version.saturating_add(1)
    }

    /// Accumulates one split payment.
    pub fn record_split(&mut self, program_id: ProgramId, split: RevenueSplit) -> AppResult<()> {
        let overflow = || AppError::Validation("revenue ledger overflow".to_owned());

        let total_revenue = self.total_revenue.checked_add(split.amount).ok_or_else(overflow)?;
        let platform_share_accrued = self
            .platform_share_accrued
            .checked_add(split.platform_share)
            .ok_or_else(overflow)?;
        let tenant_share_accrued = self
            .tenant_share_accrued
            .checked_add(split.tenant_share)
            .ok_or_else(overflow)?;
        let program_revenue = self
            .program_revenue(program_id)
            .checked_add(split.amount)
            .ok_or_else(overflow)?;

        self.total_revenue = total_revenue;
        self.platform_share_accrued = platform_share_accrued;
        self.tenant_share_accrued = tenant_share_accrued;
        self.programs.insert(program_id, program_revenue);
        Ok(())
    }

    /// Zeroes the accrued tenant share and stamps the withdrawal time.
    ///
    /// Fails while `now <= last_withdrawal_time + cooldown` or when nothing
    /// has accrued.
    pub fn withdraw_tenant_share(
        &mut self,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> AppResult<TenantShareWithdrawal> {
        if self.tenant_share_accrued == 0 {
            return Err(AppError::Conflict("no revenue to withdraw".to_owned()));
        }

        if let Some(last_withdrawal_time) = self.last_withdrawal_time
            && now <= last_withdrawal_time + cooldown
        {
            return Err(AppError::Conflict(format!(
                "withdrawal cooldown active until {}",
                last_withdrawal_time + cooldown
            )));
        }

        let withdrawal = TenantShareWithdrawal {
            amount: self.tenant_share_accrued,
            previous_withdrawal_time: self.last_withdrawal_time,
        };
        self.tenant_share_accrued = 0;
        self.last_withdrawal_time = Some(now);
        Ok(withdrawal)
    }

    /// Puts a withdrawn share back after a failed transfer.
    pub fn restore_withdrawal(&mut self, withdrawal: TenantShareWithdrawal) -> AppResult<()> {
        self.tenant_share_accrued = self
            .tenant_share_accrued
            .checked_add(withdrawal.amount)
            .ok_or_else(|| AppError::Internal("revenue ledger overflow on restore".to_owned()))?;
        self.last_withdrawal_time = withdrawal.previous_withdrawal_time;
        Ok(())
    }
}
