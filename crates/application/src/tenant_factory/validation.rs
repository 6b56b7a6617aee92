use campusly_core::{AppError, AppResult};
use campusly_domain::{DeploymentConfig, MAX_REVENUE_SHARE_PERCENT};

use crate::ProvisioningLimits;

/// Checks a requested deployment config against the platform bounds.
pub fn validate_provisioning(
    limits: &ProvisioningLimits,
    config: &DeploymentConfig,
) -> AppResult<()> {
    if config.revenue_share_percent > MAX_REVENUE_SHARE_PERCENT {
        return Err(AppError::Validation(format!(
            "revenue share must be at most {MAX_REVENUE_SHARE_PERCENT}, got {}",
            config.revenue_share_percent
        )));
    }

    if config.subscription_fee < limits.min_subscription_fee
        || config.subscription_fee > limits.max_subscription_fee
    {
        return Err(AppError::Validation(format!(
            "subscription fee {} is outside [{}, {}]",
            config.subscription_fee, limits.min_subscription_fee, limits.max_subscription_fee
        )));
    }

    if config.subscription_duration < limits.min_subscription_duration
        || config.subscription_duration > limits.max_subscription_duration
    {
        return Err(AppError::Validation(format!(
            "subscription duration of {} days is outside [{}, {}] days",
            config.subscription_duration.num_days(),
            limits.min_subscription_duration.num_days(),
            limits.max_subscription_duration.num_days()
        )));
    }

    Ok(())
}
