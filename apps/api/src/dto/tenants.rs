use campusly_core::AppError;
use campusly_domain::{DeploymentConfig, SubscriptionStatus, TenantRecord};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Tenant-specific fees and subscription period requested at provisioning.
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/deployment-config-request.ts"
)]
pub struct DeploymentConfigRequest {
    #[ts(type = "number")]
    pub program_creation_fee: u64,
    #[ts(type = "number")]
    pub subscription_fee: u64,
    #[ts(type = "number")]
    pub certificate_fee: u64,
    pub revenue_share_percent: u8,
    pub subscription_duration_days: i64,
}

impl TryFrom<DeploymentConfigRequest> for DeploymentConfig {
    type Error = AppError;

    fn try_from(value: DeploymentConfigRequest) -> Result<Self, Self::Error> {
        let subscription_duration = Duration::try_days(value.subscription_duration_days)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "subscription duration of {} days is out of range",
                    value.subscription_duration_days
                ))
            })?;

        Ok(Self {
            program_creation_fee: value.program_creation_fee,
            subscription_fee: value.subscription_fee,
            certificate_fee: value.certificate_fee,
            revenue_share_percent: value.revenue_share_percent,
            subscription_duration,
        })
    }
}

/// Incoming payload for tenant provisioning.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/provision-tenant-request.ts"
)]
pub struct ProvisionTenantRequest {
    pub organization_admin: String,
    pub config: Option<DeploymentConfigRequest>,
}

/// API representation of a tenant record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/tenant-response.ts"
)]
pub struct TenantResponse {
    pub tenant_id: String,
    pub organization_admin: String,
    pub deployed: bool,
    pub active: bool,
    pub subscription_end: String,
    pub subscription_duration_seconds: i64,
    pub provisioned_at: String,
}

impl From<TenantRecord> for TenantResponse {
    fn from(value: TenantRecord) -> Self {
        Self {
            tenant_id: value.tenant_id().to_string(),
            organization_admin: value.organization_admin().to_string(),
            deployed: value.deployed(),
            active: value.active(),
            subscription_end: value.subscription_end().to_rfc3339(),
            subscription_duration_seconds: value.subscription_duration().num_seconds(),
            provisioned_at: value.provisioned_at().to_rfc3339(),
        }
    }
}

/// Subscription state of a tenant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/subscription-status-response.ts"
)]
pub struct SubscriptionStatusResponse {
    pub status: String,
}

impl From<SubscriptionStatus> for SubscriptionStatusResponse {
    fn from(value: SubscriptionStatus) -> Self {
        Self {
            status: value.as_str().to_owned(),
        }
    }
}

/// Incoming payload for platform fee withdrawals.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/platform-withdrawal-request.ts"
)]
pub struct PlatformWithdrawalRequest {
    pub recipient: String,
    #[ts(type = "number")]
    pub amount: u64,
}

/// Platform treasury balance.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/platform-balance-response.ts"
)]
pub struct PlatformBalanceResponse {
    #[ts(type = "number")]
    pub balance: u64,
}
