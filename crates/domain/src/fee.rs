//! Fee schedules and the platform/tenant revenue split.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campusly_core::{AppError, AppResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Upper bound of a revenue share percentage.
pub const MAX_REVENUE_SHARE_PERCENT: u8 = 100;

/// Fee fields and subscription term requested for a tenant, or used as the
/// platform default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Fee charged when a program is created.
    pub program_creation_fee: u64,
    /// Fee charged per subscription period.
    pub subscription_fee: u64,
    /// Fee charged per issued certificate.
    pub certificate_fee: u64,
    /// Percentage of each payment retained by the platform.
    pub revenue_share_percent: u8,
    /// Length of one subscription period.
    pub subscription_duration: Duration,
}

impl DeploymentConfig {
    /// Returns the fee fields of this config.
    #[must_use]
    pub fn fee_fields(&self) -> FeeFields {
        FeeFields {
            program_creation_fee: self.program_creation_fee,
            subscription_fee: self.subscription_fee,
            certificate_fee: self.certificate_fee,
            revenue_share_percent: self.revenue_share_percent,
        }
    }
}

/// Fee fields without the custom flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeFields {
    /// Fee charged when a program is created.
    pub program_creation_fee: u64,
    /// Fee charged per subscription period.
    pub subscription_fee: u64,
    /// Fee charged per issued certificate.
    pub certificate_fee: u64,
    /// Percentage of each payment retained by the platform.
    pub revenue_share_percent: u8,
}

/// A resolved fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStructure {
    program_creation_fee: u64,
    subscription_fee: u64,
    certificate_fee: u64,
    revenue_share_percent: u8,
    is_custom: bool,
}

impl FeeStructure {
    /// Creates the platform default schedule. A share of exactly 100 is
    /// accepted here but not for tenant overrides.
    pub fn platform_default(fields: FeeFields) -> AppResult<Self> {
        if fields.revenue_share_percent > MAX_REVENUE_SHARE_PERCENT {
            return Err(AppError::Validation(format!(
                "default revenue share must be at most {MAX_REVENUE_SHARE_PERCENT}, got {}",
                fields.revenue_share_percent
            )));
        }

        Ok(Self::from_fields(fields, false))
    }

    /// Creates a tenant override. The share must be strictly below 100.
    pub fn custom(fields: FeeFields) -> AppResult<Self> {
        if fields.revenue_share_percent >= MAX_REVENUE_SHARE_PERCENT {
            return Err(AppError::Validation(format!(
                "custom revenue share must be below {MAX_REVENUE_SHARE_PERCENT}, got {}",
                fields.revenue_share_percent
            )));
        }

        Ok(Self::from_fields(fields, true))
    }

    /// Rehydrates a stored structure, re-checking the share bound that
    /// applies to its kind.
    pub fn restore(fields: FeeFields, is_custom: bool) -> AppResult<Self> {
        if is_custom {
            Self::custom(fields)
        } else {
            Self::platform_default(fields)
        }
    }

    fn from_fields(fields: FeeFields, is_custom: bool) -> Self {
        Self {
            program_creation_fee: fields.program_creation_fee,
            subscription_fee: fields.subscription_fee,
            certificate_fee: fields.certificate_fee,
            revenue_share_percent: fields.revenue_share_percent,
            is_custom,
        }
    }

    /// Returns the program creation fee.
    #[must_use]
    pub fn program_creation_fee(&self) -> u64 {
        self.program_creation_fee
    }

    /// Returns the subscription fee.
    #[must_use]
    pub fn subscription_fee(&self) -> u64 {
        self.subscription_fee
    }

    /// Returns the certificate fee.
    #[must_use]
    pub fn certificate_fee(&self) -> u64 {
        self.certificate_fee
    }

    /// Returns the platform's percentage of each payment.
    #[must_use]
    pub fn revenue_share_percent(&self) -> u8 {
        self.revenue_share_percent
    }

    /// Returns whether this is a tenant override.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    /// Returns the plain fee fields.
    #[must_use]
    pub fn fields(&self) -> FeeFields {
        FeeFields {
            program_creation_fee: self.program_creation_fee,
            subscription_fee: self.subscription_fee,
            certificate_fee: self.certificate_fee,
            revenue_share_percent: self.revenue_share_percent,
        }
    }

    /// Returns the fee configured for a fixed-fee collection.
    #[must_use]
    pub fn fixed_fee(&self, kind: FixedFeeKind) -> u64 {
        match kind {
            FixedFeeKind::Certificate => self.certificate_fee,
            FixedFeeKind::ProgramCreation => self.program_creation_fee,
            FixedFeeKind::Subscription => self.subscription_fee,
        }
    }

    /// Splits a payment according to this schedule.
    #[must_use]
    pub fn split(&self, amount: u64) -> RevenueSplit {
        RevenueSplit::compute(amount, self.revenue_share_percent)
    }
}

/// Platform-only fees collected without a revenue split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedFeeKind {
    /// Certificate issuance.
    Certificate,
    /// Program creation.
    ProgramCreation,
    /// Subscription period.
    Subscription,
}

impl FixedFeeKind {
    /// Returns a stable storage value for this fee kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::ProgramCreation => "program_creation",
            Self::Subscription => "subscription",
        }
    }
}

impl FromStr for FixedFeeKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "certificate" => Ok(Self::Certificate),
            "program_creation" => Ok(Self::ProgramCreation),
            "subscription" => Ok(Self::Subscription),
            _ => Err(AppError::Validation(format!(
                "unknown fixed fee kind '{value}'"
            ))),
        }
    }
}

impl Display for FixedFeeKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of splitting one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    /// Whole payment.
    pub amount: u64,
    /// Portion retained by the platform, rounded down.
    pub platform_share: u64,
    /// Remainder credited to the tenant.
    pub tenant_share: u64,
}

impl RevenueSplit {
    /// Computes `floor(amount * percent / 100)` for the platform and assigns
    /// the remainder to the tenant. Percentages above 100 are clamped.
    #[must_use]
    pub fn compute(amount: u64, revenue_share_percent: u8) -> Self {
        let percent = u128::from(revenue_share_percent.min(MAX_REVENUE_SHARE_PERCENT));
        let platform_wide = u128::from(amount) * percent / 100;
        // platform_wide <= amount, so it always fits back into u64.
        let platform_share = u64::try_from(platform_wide).unwrap_or(amount);
        let tenant_share = amount - platform_share;

        Self {
            amount,
            platform_share,
            tenant_share,
        }
    }
}
