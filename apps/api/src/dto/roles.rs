use campusly_core::{AccountId, AppResult, TenantId};
use campusly_domain::{Role, RoleGrant, RoleScope};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for granting or revoking a role.
///
/// Omitting `tenant_id` targets the global scope.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-grant-request.ts"
)]
pub struct RoleGrantRequest {
    pub role: String,
    pub account: String,
    pub tenant_id: Option<String>,
}

impl RoleGrantRequest {
    pub fn parse(&self) -> AppResult<(Role, AccountId, RoleScope)> {
        let scope = self
            .tenant_id
            .as_deref()
            .map(TenantId::parse)
            .transpose()?;

        Ok((
            Role::from_transport(self.role.as_str())?,
            AccountId::parse(self.account.as_str())?,
            RoleScope::from_option(scope),
        ))
    }
}

/// API representation of one role grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-grant-response.ts"
)]
pub struct RoleGrantResponse {
    pub role: String,
    pub account: String,
    pub tenant_id: Option<String>,
}

impl From<RoleGrant> for RoleGrantResponse {
    fn from(value: RoleGrant) -> Self {
        Self {
            role: value.role.as_str().to_owned(),
            account: value.account.to_string(),
            tenant_id: value.scope.tenant_id().map(|tenant_id| tenant_id.to_string()),
        }
    }
}

/// Incoming payload for a tenant admin managing member roles.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/member-role-request.ts"
)]
pub struct MemberRoleRequest {
    pub role: String,
    pub account: String,
}
