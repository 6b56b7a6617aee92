//! Tenant records and subscription arithmetic.

use campusly_core::{AccountId, AppError, AppResult, TenantId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one organization's tenant. `NotProvisioned` is represented
/// by the absence of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantLifecycle {
    /// Provisioned and not deactivated.
    Active,
    /// Terminal state. No reactivation path exists.
    Deactivated,
}

/// Subscription standing relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// `now <= subscription_end`.
    Active,
    /// Past the end but inside the grace window.
    InGrace,
    /// Past the end and the grace window.
    Expired,
    /// The tenant was deactivated.
    Deactivated,
}

impl SubscriptionStatus {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::InGrace => "in_grace",
            Self::Expired => "expired",
            Self::Deactivated => "deactivated",
        }
    }
}

/// Provisioning and subscription state of one organization's tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    tenant_id: TenantId,
    organization_admin: AccountId,
    deployed: bool,
    active: bool,
    subscription_end: DateTime<Utc>,
    subscription_duration: Duration,
    provisioned_at: DateTime<Utc>,
}

impl TenantRecord {
    /// Creates the record written at provisioning time.
    pub fn provisioned(
        tenant_id: TenantId,
        organization_admin: AccountId,
        now: DateTime<Utc>,
        subscription_duration: Duration,
    ) -> AppResult<Self> {
        if subscription_duration <= Duration::zero() {
            return Err(AppError::Validation(
                "subscription duration must be positive".to_owned(),
            ));
        }

        let subscription_end = now
            .checked_add_signed(subscription_duration)
            .ok_or_else(|| AppError::Validation("subscription end overflows".to_owned()))?;

        Ok(Self {
            tenant_id,
            organization_admin,
            deployed: true,
            active: true,
            subscription_end,
            subscription_duration,
            provisioned_at: now,
        })
    }

    /// Rehydrates a stored record.
    #[must_use]
    pub fn restore(
        tenant_id: TenantId,
        organization_admin: AccountId,
        deployed: bool,
        active: bool,
        subscription_end: DateTime<Utc>,
        subscription_duration: Duration,
        provisioned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            organization_admin,
            deployed,
            active,
            subscription_end,
            subscription_duration,
            provisioned_at,
        }
    }

    /// Returns the tenant handle.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the owning organization admin.
    #[must_use]
    pub fn organization_admin(&self) -> AccountId {
        self.organization_admin
    }

    /// Returns whether the bundle was deployed.
    #[must_use]
    pub fn deployed(&self) -> bool {
        self.deployed
    }

    /// Returns whether the tenant is still active.
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Returns the end of the paid subscription.
    #[must_use]
    pub fn subscription_end(&self) -> DateTime<Utc> {
        self.subscription_end
    }

    /// Returns the length of one subscription period.
    #[must_use]
    pub fn subscription_duration(&self) -> Duration {
        self.subscription_duration
    }

    /// Returns when the tenant was provisioned.
    #[must_use]
    pub fn provisioned_at(&self) -> DateTime<Utc> {
        self.provisioned_at
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> TenantLifecycle {
        if self.active {
            TenantLifecycle::Active
        } else {
            TenantLifecycle::Deactivated
        }
    }

    /// Returns whether the tenant is active and not past its end.
    #[must_use]
    pub fn is_subscription_current(&self, now: DateTime<Utc>) -> bool {
        self.active && now <= self.subscription_end
    }

    /// Reports the subscription standing at `now`.
    #[must_use]
    pub fn subscription_status(
        &self,
        now: DateTime<Utc>,
        grace_period: Duration,
    ) -> SubscriptionStatus {
        if !self.active {
            return SubscriptionStatus::Deactivated;
        }

        if now <= self.subscription_end {
            SubscriptionStatus::Active
        } else if now <= self.subscription_end + grace_period {
            SubscriptionStatus::InGrace
        } else {
            SubscriptionStatus::Expired
        }
    }

    /// Computes the end a renewal at `now` would produce. Inside the grace
    /// window the period is appended to the prior end; past it the period
    /// starts at `now` and the lapsed gap is lost.
    pub fn renewed_end(
        &self,
        now: DateTime<Utc>,
        grace_period: Duration,
    ) -> AppResult<DateTime<Utc>> {
        let anchor = if now <= self.subscription_end + grace_period {
            self.subscription_end
        } else {
            now
        };

        anchor
            .checked_add_signed(self.subscription_duration)
            .ok_or_else(|| AppError::Validation("subscription end overflows".to_owned()))
    }

    /// Extends the subscription and returns the new end.
    pub fn renew(
        &mut self,
        now: DateTime<Utc>,
        grace_period: Duration,
    ) -> AppResult<DateTime<Utc>> {
        if !self.active {
            return Err(AppError::Conflict(format!(
                "tenant '{}' is deactivated",
                self.tenant_id
            )));
        }

        let renewed_end = self.renewed_end(now, grace_period)?;
        self.subscription_end = self.subscription_end.max(renewed_end);
        Ok(self.subscription_end)
    }

    /// Moves the tenant into the terminal deactivated state.
    pub fn deactivate(&mut self) -> AppResult<()> {
        if !self.active {
            return Err(AppError::Conflict(format!(
                "tenant '{}' is already deactivated",
                self.tenant_id
            )));
        }

        self.active = false;
        Ok(())
    }
}
