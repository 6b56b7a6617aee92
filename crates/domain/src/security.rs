use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campusly_core::{AccountId, AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};

/// Capabilities resolved by the role registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform owner. Only holder allowed to grant global roles.
    Master,
    /// Administrator, either platform-wide or of one tenant.
    Admin,
    /// Capability held by a provisioned tenant over its own scope.
    Tenant,
    /// Teaching staff inside a tenant.
    Teacher,
    /// Enrolled student inside a tenant.
    Student,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Admin => "admin",
            Self::Tenant => "tenant",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Master,
            Role::Admin,
            Role::Tenant,
            Role::Teacher,
            Role::Student,
        ];

        ALL
    }

    /// Parses a transport value into a role.
    pub fn from_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "master" => Ok(Self::Master),
            "admin" => Ok(Self::Admin),
            "tenant" => Ok(Self::Tenant),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Partition of role grants: platform-wide or one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tenant_id")]
pub enum RoleScope {
    /// Platform-wide sentinel scope.
    Global,
    /// Scope of a single tenant.
    Tenant(TenantId),
}

impl RoleScope {
    /// Returns the tenant of a tenant scope.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Global => None,
            Self::Tenant(tenant_id) => Some(*tenant_id),
        }
    }

    /// Returns whether this is the global sentinel.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Builds a scope from an optional tenant, `None` meaning global.
    #[must_use]
    pub fn from_option(tenant_id: Option<TenantId>) -> Self {
        tenant_id.map_or(Self::Global, Self::Tenant)
    }
}

impl Display for RoleScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => formatter.write_str("global"),
            Self::Tenant(tenant_id) => write!(formatter, "tenant:{tenant_id}"),
        }
    }
}

/// One `(role, account, scope)` assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Granted role.
    pub role: Role,
    /// Grantee.
    pub account: AccountId,
    /// Scope the grant applies to.
    pub scope: RoleScope,
}

impl RoleGrant {
    /// Creates a grant after rejecting null identities.
    pub fn new(role: Role, account: AccountId, scope: RoleScope) -> AppResult<Self> {
        if account.is_nil() {
            return Err(AppError::Validation(
                "role grantee must not be the null identity".to_owned(),
            ));
        }

        if scope.tenant_id().is_some_and(|tenant_id| tenant_id.is_nil()) {
            return Err(AppError::Validation(
                "role scope must not be the null tenant".to_owned(),
            ));
        }

        Ok(Self {
            role,
            account,
            scope,
        })
    }

    /// Creates a platform-wide grant.
    pub fn global(role: Role, account: AccountId) -> AppResult<Self> {
        Self::new(role, account, RoleScope::Global)
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A role was granted.
    RoleGranted,
    /// A role was revoked.
    RoleRevoked,
    /// A tenant bundle was provisioned.
    TenantProvisioned,
    /// A tenant subscription was renewed.
    TenantRenewed,
    /// A tenant was deactivated.
    TenantDeactivated,
    /// Platform funds were transferred out.
    PlatformFeesWithdrawn,
    /// A payment was split between platform and tenant.
    RevenueSplitRecorded,
    /// A tenant withdrew its accrued share.
    RevenueWithdrawn,
    /// A fixed platform fee was collected.
    FixedFeeCollected,
    /// The platform default fee structure changed.
    DefaultFeeStructureUpdated,
    /// A tenant fee override was set or cleared.
    CustomFeeStructureUpdated,
    /// Pushing fees to a tenant instance failed.
    FeeSyncFailed,
    /// A tenant instance was permanently recovered.
    InstanceRecovered,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleGranted => "security.role.granted",
            Self::RoleRevoked => "security.role.revoked",
            Self::TenantProvisioned => "tenant.provisioned",
            Self::TenantRenewed => "tenant.renewed",
            Self::TenantDeactivated => "tenant.deactivated",
            Self::PlatformFeesWithdrawn => "platform.fees.withdrawn",
            Self::RevenueSplitRecorded => "revenue.split.recorded",
            Self::RevenueWithdrawn => "revenue.withdrawn",
            Self::FixedFeeCollected => "revenue.fixed_fee.collected",
            Self::DefaultFeeStructureUpdated => "fees.default.updated",
            Self::CustomFeeStructureUpdated => "fees.custom.updated",
            Self::FeeSyncFailed => "fees.sync.failed",
            Self::InstanceRecovered => "instance.recovered",
        }
    }
}
