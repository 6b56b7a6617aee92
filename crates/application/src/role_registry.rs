//! Scoped role resolution shared by every tenant-scoped service.

use std::sync::Arc;

use async_trait::async_trait;
use campusly_core::{AccountId, AppError, AppResult, CallContext};
use campusly_domain::{AuditAction, Role, RoleGrant, RoleScope};
use tracing::info;

use crate::audit_ports::append_committed_event;
use crate::{AuditEvent, AuditRepository};

/// Repository port for role assignments, one entry per
/// `(role, account, scope)` triple.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Stores a grant. Returns `false` when it already existed.
    async fn insert_grant(&self, grant: RoleGrant) -> AppResult<bool>;

    /// Removes a grant. Returns `false` when it did not exist.
    async fn delete_grant(&self, grant: RoleGrant) -> AppResult<bool>;

    /// Returns whether the exact triple is stored.
    async fn contains_grant(&self, grant: RoleGrant) -> AppResult<bool>;

    /// Returns whether any account holds `role` in `scope`.
    async fn any_holder(&self, role: Role, scope: RoleScope) -> AppResult<bool>;

    /// Lists every grant held by an account.
    async fn list_grants_for_account(&self, account: AccountId) -> AppResult<Vec<RoleGrant>>;
}

/// Single source of truth for scoped authorization.
#[derive(Clone)]
pub struct RoleRegistry {
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleRegistry {
    /// Creates a registry over a role repository.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
        }
    }

    /// Returns true iff `account` holds `role` globally or in `scope`.
    ///
    /// Passing [`RoleScope::Global`] makes this a global-only lookup.
    pub async fn check(&self, role: Role, account: AccountId, scope: RoleScope) -> AppResult<bool> {
        if account.is_nil() {
            return Ok(false);
        }

        let global = RoleGrant {
            role,
            account,
            scope: RoleScope::Global,
        };
        if self.repository.contains_grant(global).await? {
            return Ok(true);
        }

        if scope.is_global() {
            return Ok(false);
        }

        self.repository
            .contains_grant(RoleGrant {
                role,
                account,
                scope,
            })
            .await
    }

    /// Like [`Self::check`] but fails with `Forbidden` when the role is missing.
    pub async fn require(&self, role: Role, account: AccountId, scope: RoleScope) -> AppResult<()> {
        if self.check(role, account, scope).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "account '{account}' is missing role '{role}' in scope '{scope}'"
        )))
    }

    /// Returns whether the account holds the global master or admin role.
    pub async fn is_platform_admin(&self, account: AccountId) -> AppResult<bool> {
        Ok(self.check(Role::Master, account, RoleScope::Global).await?
            || self.check(Role::Admin, account, RoleScope::Global).await?)
    }

    /// Fails with `Forbidden` unless the account is a platform admin.
    pub async fn require_platform_admin(&self, account: AccountId) -> AppResult<()> {
        if self.is_platform_admin(account).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "account '{account}' is not a platform administrator"
        )))
    }

    /// Grants a role inside a tenant scope.
    ///
    /// Allowed for platform admins, and for a tenant's own instance when it
    /// holds `Admin` over its own scope.
    pub async fn grant_scoped(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
        scope: RoleScope,
    ) -> AppResult<()> {
        let grant = Self::scoped_grant(role, account, scope)?;
        self.require_scope_administrator(context.caller(), scope).await?;

        if self.repository.insert_grant(grant).await? {
            self.record_change(context.caller(), grant, AuditAction::RoleGranted)
                .await;
        }

        Ok(())
    }

    /// Revokes a role inside a tenant scope. Revoking an unassigned role is a
    /// no-op.
    pub async fn revoke_scoped(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
        scope: RoleScope,
    ) -> AppResult<()> {
        let grant = Self::scoped_grant(role, account, scope)?;
        self.require_scope_administrator(context.caller(), scope).await?;

        if self.repository.delete_grant(grant).await? {
            self.record_change(context.caller(), grant, AuditAction::RoleRevoked)
                .await;
        }

        Ok(())
    }

    /// Grants a platform-wide role. Restricted to the master capability.
    pub async fn grant_global(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        let grant = RoleGrant::global(role, account)?;
        self.require(Role::Master, context.caller(), RoleScope::Global)
            .await?;

        if self.repository.insert_grant(grant).await? {
            self.record_change(context.caller(), grant, AuditAction::RoleGranted)
                .await;
        }

        Ok(())
    }

    /// Revokes a platform-wide role. Restricted to the master capability.
    pub async fn revoke_global(
        &self,
        context: &CallContext,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        let grant = RoleGrant::global(role, account)?;
        self.require(Role::Master, context.caller(), RoleScope::Global)
            .await?;

        if grant.role == Role::Master && grant.account == context.caller() {
            return Err(AppError::Conflict(
                "the master account cannot revoke its own master role".to_owned(),
            ));
        }

        if self.repository.delete_grant(grant).await? {
            self.record_change(context.caller(), grant, AuditAction::RoleRevoked)
                .await;
        }

        Ok(())
    }

    /// Seeds the first master grant. Returns `false` when a master already
    /// exists.
    pub async fn bootstrap_master(&self, account: AccountId) -> AppResult<bool> {
        let grant = RoleGrant::global(Role::Master, account)?;

        if self
            .repository
            .any_holder(Role::Master, RoleScope::Global)
            .await?
        {
            return Ok(false);
        }

        let inserted = self.repository.insert_grant(grant).await?;
        if inserted {
            info!(account = %account, "bootstrapped platform master account");
            self.record_change(account, grant, AuditAction::RoleGranted)
                .await;
        }

        Ok(inserted)
    }

    /// Lists grants held by an account.
    pub async fn list_grants(&self, account: AccountId) -> AppResult<Vec<RoleGrant>> {
        let mut grants = self.repository.list_grants_for_account(account).await?;
        grants.sort();
        Ok(grants)
    }

    fn scoped_grant(role: Role, account: AccountId, scope: RoleScope) -> AppResult<RoleGrant> {
        if scope.is_global() {
            return Err(AppError::Validation(
                "scoped grants need a tenant scope; use the global grant for platform roles"
                    .to_owned(),
            ));
        }

        if role == Role::Master {
            return Err(AppError::Validation(
                "the master role only exists in the global scope".to_owned(),
            ));
        }

        RoleGrant::new(role, account, scope)
    }

    async fn require_scope_administrator(
        &self,
        caller: AccountId,
        scope: RoleScope,
    ) -> AppResult<()> {
        if self.is_platform_admin(caller).await? {
            return Ok(());
        }

        let is_scope_identity = scope
            .tenant_id()
            .is_some_and(|tenant_id| tenant_id.as_account() == caller);
        if is_scope_identity && self.check(Role::Admin, caller, scope).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "account '{caller}' may not administer roles in scope '{scope}'"
        )))
    }

    async fn record_change(&self, actor: AccountId, grant: RoleGrant, action: AuditAction) {
        info!(
            actor = %actor,
            role = grant.role.as_str(),
            account = %grant.account,
            scope = %grant.scope,
            action = action.as_str(),
            "role assignment changed"
        );

        append_committed_event(
            self.audit_repository.as_ref(),
            AuditEvent {
                tenant_id: grant.scope.tenant_id(),
                subject: actor,
                action,
                resource_type: "role_grant".to_owned(),
                resource_id: format!("{}:{}:{}", grant.role, grant.account, grant.scope),
                detail: None,
            },
        )
        .await;
    }
}
