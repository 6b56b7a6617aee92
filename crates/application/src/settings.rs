use campusly_core::{AccountId, AppError, AppResult};
use campusly_domain::{DeploymentConfig, FeeFields, FeeStructure, RateLimitPolicy};
use chrono::Duration;

/// Accounts every cloned tenant instance is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceWiring {
    /// Revenue account service identity.
    pub revenue_account: AccountId,
    /// Tenant profile service identity.
    pub tenant_profile: AccountId,
    /// Tuition service identity.
    pub tuition: AccountId,
    /// Role registry identity.
    pub role_registry: AccountId,
    /// Platform master admin.
    pub master_admin: AccountId,
}

/// Bounds a requested deployment config must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningLimits {
    /// Lowest accepted subscription fee.
    pub min_subscription_fee: u64,
    /// Highest accepted subscription fee.
    pub max_subscription_fee: u64,
    /// Shortest accepted subscription period.
    pub min_subscription_duration: Duration,
    /// Longest accepted subscription period.
    pub max_subscription_duration: Duration,
}

/// Platform-wide configuration consumed by the application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSettings {
    /// Account seeded with the global master role at startup.
    pub master_account: AccountId,
    /// Account the tenant factory acts as when it grants roles and pushes
    /// fee overrides. Must hold global admin.
    pub factory_account: AccountId,
    /// Default fee schedule.
    pub default_fees: FeeFields,
    /// Subscription period used when no config is supplied.
    pub default_subscription_duration: Duration,
    /// Bounds for tenant configs.
    pub provisioning_limits: ProvisioningLimits,
    /// Window past expiry during which renewal keeps the prior end.
    pub grace_period: Duration,
    /// Minimum time between two tenant withdrawals.
    pub withdrawal_cooldown: Duration,
    /// Throttle applied to tenant-scoped fee collection.
    pub collection_rate_limit: RateLimitPolicy,
    /// Wiring handed to every cloned instance.
    pub service_wiring: ServiceWiring,
}

impl PlatformSettings {
    /// Checks cross-field consistency.
    pub fn validate(&self) -> AppResult<()> {
        if self.master_account.is_nil() || self.factory_account.is_nil() {
            return Err(AppError::Validation(
                "master and factory accounts must not be the null identity".to_owned(),
            ));
        }

        FeeStructure::platform_default(self.default_fees)?;

        let limits = &self.provisioning_limits;
        if limits.min_subscription_fee > limits.max_subscription_fee {
            return Err(AppError::Validation(
                "minimum subscription fee exceeds maximum".to_owned(),
            ));
        }

        if limits.min_subscription_duration <= Duration::zero()
            || limits.min_subscription_duration > limits.max_subscription_duration
        {
            return Err(AppError::Validation(
                "subscription duration bounds must be positive and ordered".to_owned(),
            ));
        }

        if self.default_subscription_duration < limits.min_subscription_duration
            || self.default_subscription_duration > limits.max_subscription_duration
        {
            return Err(AppError::Validation(
                "default subscription duration is outside the configured bounds".to_owned(),
            ));
        }

        if self.grace_period < Duration::zero() || self.withdrawal_cooldown < Duration::zero() {
            return Err(AppError::Validation(
                "grace period and withdrawal cooldown must not be negative".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns the platform default as a deployment config.
    #[must_use]
    pub fn default_deployment_config(&self) -> DeploymentConfig {
        DeploymentConfig {
            program_creation_fee: self.default_fees.program_creation_fee,
            subscription_fee: self.default_fees.subscription_fee,
            certificate_fee: self.default_fees.certificate_fee,
            revenue_share_percent: self.default_fees.revenue_share_percent,
            subscription_duration: self.default_subscription_duration,
        }
    }
}
