//! Gates every tenant-scoped instance applies before changing state.

use std::sync::Arc;

use campusly_core::{AccountId, AppError, AppResult, CallContext, TenantId};
use campusly_domain::{AuditAction, InstanceStatus, RateLimitWindow, Role, RoleScope};
use tracing::info;

use crate::audit_ports::append_committed_event;
use crate::{
    AuditEvent, AuditRepository, Clock, InstanceStatusRepository, RateLimitRule, RateLimitService,
    RoleRegistry, TenantRepository,
};

/// Ports shared by every tenant gate.
#[derive(Clone)]
pub struct TenantGatePorts {
    /// Authoritative tenant records.
    pub tenants: Arc<dyn TenantRepository>,
    /// Kill switch state.
    pub statuses: Arc<dyn InstanceStatusRepository>,
    /// Audit log.
    pub audit: Arc<dyn AuditRepository>,
}

/// Role, subscription, kill switch and throttle checks bound to one tenant.
#[derive(Clone)]
pub struct TenantGate {
    tenant_id: TenantId,
    ports: TenantGatePorts,
    role_registry: RoleRegistry,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl TenantGate {
    /// Creates the gate of one tenant instance.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        ports: TenantGatePorts,
        role_registry: RoleRegistry,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenant_id,
            ports,
            role_registry,
            rate_limits,
            clock,
        }
    }

    /// Returns the tenant this gate guards.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn scope(&self) -> RoleScope {
        RoleScope::Tenant(self.tenant_id)
    }

    /// Fails with `Forbidden` unless `caller` holds `role` globally or in
    /// this tenant.
    pub async fn require_role(&self, role: Role, caller: AccountId) -> AppResult<()> {
        self.role_registry.require(role, caller, self.scope()).await
    }

    /// Fails with `Forbidden` unless `caller` holds at least one of `roles`.
    pub async fn require_any_role(&self, roles: &[Role], caller: AccountId) -> AppResult<()> {
        for role in roles {
            if self.role_registry.check(*role, caller, self.scope()).await? {
                return Ok(());
            }
        }

        Err(AppError::Forbidden(format!(
            "account '{caller}' holds none of the required roles in tenant '{}'",
            self.tenant_id
        )))
    }

    /// Fails with `Conflict` unless the tenant record is active and not past
    /// its subscription end.
    pub async fn require_active_subscription(&self) -> AppResult<()> {
        let record = self
            .ports
            .tenants
            .find_by_tenant(self.tenant_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!("tenant '{}' is not provisioned", self.tenant_id))
            })?;

        if !record.active() {
            return Err(AppError::Conflict(format!(
                "tenant '{}' is deactivated",
                self.tenant_id
            )));
        }

        if !record.is_subscription_current(self.clock.now()) {
            return Err(AppError::Conflict(format!(
                "subscription of tenant '{}' expired at {}",
                self.tenant_id,
                record.subscription_end()
            )));
        }

        Ok(())
    }

    /// Returns the kill switch state.
    pub async fn status(&self) -> AppResult<InstanceStatus> {
        self.ports.statuses.find_status(self.tenant_id).await
    }

    /// Fails with `Conflict` once the instance has been recovered.
    pub async fn require_operational(&self) -> AppResult<()> {
        self.status().await?.ensure_operational()
    }

    /// Flips the kill switch. There is no way back.
    pub async fn recover(&self, context: &CallContext) -> AppResult<InstanceStatus> {
        let caller = context.caller();
        if !self.role_registry.is_platform_admin(caller).await? {
            self.require_role(Role::Admin, caller).await?;
        }

        let current = self.status().await?;
        let next = current.recover()?;
        if !self
            .ports
            .statuses
            .transition(self.tenant_id, current, next)
            .await?
        {
            return Err(AppError::Conflict("instance already recovered".to_owned()));
        }

        info!(tenant_id = %self.tenant_id, actor = %caller, "tenant instance recovered");
        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: Some(self.tenant_id),
                subject: caller,
                action: AuditAction::InstanceRecovered,
                resource_type: "instance_status".to_owned(),
                resource_id: self.tenant_id.to_string(),
                detail: None,
            },
        )
        .await;

        Ok(next)
    }

    /// Admits one event for `caller` under `rule`, scoped to this tenant.
    pub async fn throttle(
        &self,
        caller: AccountId,
        rule: &RateLimitRule,
    ) -> AppResult<RateLimitWindow> {
        let tenant_rule = RateLimitRule::new(
            format!("{}/{}", self.tenant_id, rule.category),
            rule.policy,
        );
        self.rate_limits
            .check_rate_limit(&tenant_rule, caller)
            .await
    }

    /// Runs the gates every state-changing tenant call passes: kill switch,
    /// role, subscription, then throttle.
    pub async fn guard_mutation(
        &self,
        context: &CallContext,
        roles: &[Role],
        rule: &RateLimitRule,
    ) -> AppResult<()> {
        self.require_operational().await?;
        self.require_any_role(roles, context.caller()).await?;
        self.require_active_subscription().await?;
        self.throttle(context.caller(), rule).await?;
        Ok(())
    }

    /// Grants a member role inside this tenant. The caller must be a tenant
    /// admin; the grant is made by the tenant's own identity.
    pub async fn grant_member_role(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        self.require_operational().await?;
        Self::ensure_member_role(role)?;
        self.require_role(Role::Admin, context.caller()).await?;

        self.role_registry
            .grant_scoped(
                &context.forwarded_as(self.tenant_id.as_account()),
                role,
                account,
                self.scope(),
            )
            .await
    }

    /// Revokes a member role inside this tenant.
    pub async fn revoke_member_role(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        self.require_operational().await?;
        Self::ensure_member_role(role)?;
        self.require_role(Role::Admin, context.caller()).await?;

        self.role_registry
            .revoke_scoped(
                &context.forwarded_as(self.tenant_id.as_account()),
                role,
                account,
                self.scope(),
            )
            .await
    }

    fn ensure_member_role(role: Role) -> AppResult<()> {
        match role {
            Role::Teacher | Role::Student => Ok(()),
            _ => Err(AppError::Validation(format!(
                "role '{role}' cannot be granted by a tenant"
            ))),
        }
    }
}
