use campusly_core::{AccountId, TenantId};
use campusly_domain::{DeploymentConfig, FeeFields, Role, RoleScope};
use chrono::Duration;

use crate::{InstanceKind, PlatformSettings, ServiceWiring};

/// A role grant the executor applies in the role registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedGrant {
    /// Granted role.
    pub role: Role,
    /// Receiving account.
    pub account: AccountId,
    /// Scope of the grant.
    pub scope: RoleScope,
    /// Instance whose local access list receives the same grant.
    pub mirror_on: Option<InstanceKind>,
}

/// Everything one provisioning creates, computed before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    /// Handle of the new tenant.
    pub tenant_id: TenantId,
    /// Account that will own the tenant.
    pub organization_admin: AccountId,
    /// Templates to clone, in order.
    pub instances: Vec<InstanceKind>,
    /// Wiring handed to every instance.
    pub wiring: ServiceWiring,
    /// Role grants, in order.
    pub role_grants: Vec<PlannedGrant>,
    /// Fee override pushed to the revenue account.
    pub custom_fees: Option<FeeFields>,
    /// Subscription period of the new tenant.
    pub subscription_duration: Duration,
    /// Payment credited to the platform treasury.
    pub payment: u64,
}

impl ProvisioningPlan {
    /// Builds the plan for a validated request.
    #[must_use]
    pub fn build(
        tenant_id: TenantId,
        organization_admin: AccountId,
        config: Option<&DeploymentConfig>,
        settings: &PlatformSettings,
        payment: u64,
    ) -> Self {
        let scope = RoleScope::Tenant(tenant_id);
        let tenant_root = tenant_id.as_account();

        let role_grants = vec![
            PlannedGrant {
                role: Role::Tenant,
                account: tenant_root,
                scope,
                mirror_on: None,
            },
            PlannedGrant {
                role: Role::Admin,
                account: tenant_root,
                scope,
                mirror_on: None,
            },
            PlannedGrant {
                role: Role::Admin,
                account: organization_admin,
                scope,
                mirror_on: Some(InstanceKind::TenantRoot),
            },
        ];

        Self {
            tenant_id,
            organization_admin,
            instances: InstanceKind::ALL.to_vec(),
            wiring: settings.service_wiring,
            role_grants,
            custom_fees: config.map(DeploymentConfig::fee_fields),
            subscription_duration: config.map_or(
                settings.default_subscription_duration,
                |config| config.subscription_duration,
            ),
            payment,
        }
    }
}
