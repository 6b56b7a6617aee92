//! Tenant provisioning and subscription lifecycle.
//!
//! Provisioning runs in three stages: [`validate_provisioning`] checks the
//! request, [`ProvisioningPlan::build`] decides what to create, and the
//! executor applies the plan with a compensation for every completed step.

use std::sync::Arc;

use campusly_core::{AccountId, AppError, AppResult, CallContext, TenantId};
use campusly_domain::{AuditAction, DeploymentConfig, SubscriptionStatus, TenantRecord};
use tracing::{info, warn};

use crate::audit_ports::append_committed_event;
use crate::{
    AccountDirectory, AccountKind, AuditEvent, AuditRepository, Clock, FundsTransfer,
    InstanceProvisioner, PlatformSettings, PlatformTreasury, RevenueAccount, RoleRegistry,
    TenantProfileService, TenantRepository,
};

mod executor;
mod plan;
mod validation;

pub use plan::{PlannedGrant, ProvisioningPlan};
pub use validation::validate_provisioning;

/// Ports the tenant factory drives.
#[derive(Clone)]
pub struct TenantFactoryPorts {
    /// Authoritative tenant records.
    pub tenants: Arc<dyn TenantRepository>,
    /// Template cloning and instance wiring.
    pub instances: Arc<dyn InstanceProvisioner>,
    /// Tenant profile collaborator.
    pub profiles: Arc<dyn TenantProfileService>,
    /// Account kind lookup.
    pub accounts: Arc<dyn AccountDirectory>,
    /// Platform funds.
    pub treasury: Arc<dyn PlatformTreasury>,
    /// Outbound transfers for platform fee withdrawals.
    pub funds_transfer: Arc<dyn FundsTransfer>,
    /// Audit log.
    pub audit: Arc<dyn AuditRepository>,
}

/// Provisions tenants and owns their subscriptions.
#[derive(Clone)]
pub struct TenantFactory {
    ports: TenantFactoryPorts,
    role_registry: RoleRegistry,
    revenue_account: RevenueAccount,
    clock: Arc<dyn Clock>,
    settings: PlatformSettings,
}

impl TenantFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new(
        ports: TenantFactoryPorts,
        role_registry: RoleRegistry,
        revenue_account: RevenueAccount,
        clock: Arc<dyn Clock>,
        settings: PlatformSettings,
    ) -> Self {
        Self {
            ports,
            role_registry,
            revenue_account,
            clock,
            settings,
        }
    }

    /// Provisions a tenant for `organization_admin`.
    ///
    /// `config` overrides the platform default fee schedule and subscription
    /// period. The attached value must cover the default subscription fee.
    pub async fn provision(
        &self,
        context: &CallContext,
        organization_admin: AccountId,
        config: Option<DeploymentConfig>,
    ) -> AppResult<TenantRecord> {
        if let Some(existing) = self
            .ports
            .tenants
            .find_by_organization(organization_admin)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "organization '{organization_admin}' already owns tenant '{}'",
                existing.tenant_id()
            )));
        }

        if organization_admin.is_nil() {
            return Err(AppError::Validation(
                "organization admin must not be the null identity".to_owned(),
            ));
        }

        if self.ports.accounts.account_kind(organization_admin).await? == AccountKind::Program {
            return Err(AppError::Validation(format!(
                "organization admin '{organization_admin}' is a program identity"
            )));
        }

        let required_fee = self
            .revenue_account
            .default_fee_structure()
            .await?
            .subscription_fee();
        if context.attached_value() < required_fee {
            return Err(AppError::Payment(format!(
                "provisioning requires a payment of at least {required_fee}, got {}",
                context.attached_value()
            )));
        }

        if let Some(config) = &config {
            validate_provisioning(&self.settings.provisioning_limits, config)?;
        }

        let plan = ProvisioningPlan::build(
            TenantId::new(),
            organization_admin,
            config.as_ref(),
            &self.settings,
            context.attached_value(),
        );
        let record = self.execute(&plan, self.clock.now()).await?;

        info!(
            tenant_id = %record.tenant_id(),
            organization_admin = %organization_admin,
            subscription_end = %record.subscription_end(),
            custom_fees = plan.custom_fees.is_some(),
            "tenant provisioned"
        );
        self.record_lifecycle_event(
            context,
            &record,
            AuditAction::TenantProvisioned,
            Some(format!("payment={}", plan.payment)),
        )
        .await;

        Ok(record)
    }

    /// Extends a tenant's subscription by one period.
    ///
    /// Within the grace window the period is appended to the prior end;
    /// after it the period starts now.
    pub async fn renew(
        &self,
        context: &CallContext,
        organization_admin: AccountId,
    ) -> AppResult<TenantRecord> {
        let record = self.require_record(organization_admin).await?;

        let mut renewed = record.clone();
        renewed.renew(self.clock.now(), self.settings.grace_period)?;

        let required_fee = self
            .revenue_account
            .subscription_fee(record.tenant_id())
            .await?;
        if context.attached_value() < required_fee {
            return Err(AppError::Payment(format!(
                "renewal requires a payment of at least {required_fee}, got {}",
                context.attached_value()
            )));
        }

        let payment = context.attached_value();
        if payment > 0 {
            self.ports.treasury.credit(payment).await?;
        }

        if let Err(error) = self.ports.tenants.replace(&record, renewed.clone()).await {
            if payment > 0
                && let Err(reversal_error) = self.ports.treasury.debit(payment).await
            {
                warn!(
                    tenant_id = %record.tenant_id(),
                    amount = payment,
                    error = %reversal_error,
                    "failed to reverse renewal payment"
                );
            }
            return Err(error);
        }

        info!(
            tenant_id = %renewed.tenant_id(),
            previous_end = %record.subscription_end(),
            subscription_end = %renewed.subscription_end(),
            "tenant subscription renewed"
        );
        self.record_lifecycle_event(
            context,
            &renewed,
            AuditAction::TenantRenewed,
            Some(format!(
                "payment={payment} subscription_end={}",
                renewed.subscription_end()
            )),
        )
        .await;

        Ok(renewed)
    }

    /// Deactivates a tenant for good. Role grants are left in place.
    pub async fn deactivate(
        &self,
        context: &CallContext,
        organization_admin: AccountId,
    ) -> AppResult<TenantRecord> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;

        let record = self.require_record(organization_admin).await?;
        let mut deactivated = record.clone();
        deactivated.deactivate()?;
        self.ports
            .tenants
            .replace(&record, deactivated.clone())
            .await?;

        info!(tenant_id = %deactivated.tenant_id(), "tenant deactivated");
        self.record_lifecycle_event(context, &deactivated, AuditAction::TenantDeactivated, None)
            .await;

        Ok(deactivated)
    }

    /// Sends accumulated platform funds to `recipient` and returns the
    /// remaining balance.
    ///
    /// The treasury is debited before the transfer and credited back when
    /// the transfer fails.
    pub async fn withdraw_platform_fees(
        &self,
        context: &CallContext,
        recipient: AccountId,
        amount: u64,
    ) -> AppResult<u64> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;

        if recipient.is_nil() {
            return Err(AppError::Validation(
                "withdrawal recipient must not be the null identity".to_owned(),
            ));
        }

        if amount == 0 {
            return Err(AppError::Validation(
                "withdrawal amount must be greater than zero".to_owned(),
            ));
        }

        let remaining = self.ports.treasury.debit(amount).await?;

        if let Err(error) = self.ports.funds_transfer.transfer(recipient, amount).await {
            if let Err(reversal_error) = self.ports.treasury.credit(amount).await {
                warn!(
                    amount,
                    error = %reversal_error,
                    "failed to restore platform funds after transfer failure"
                );
            }
            return Err(error);
        }

        info!(recipient = %recipient, amount, remaining, "platform fees withdrawn");
        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: None,
                subject: context.caller(),
                action: AuditAction::PlatformFeesWithdrawn,
                resource_type: "platform_treasury".to_owned(),
                resource_id: "platform".to_owned(),
                detail: Some(format!("amount={amount} recipient={recipient}")),
            },
        )
        .await;

        Ok(remaining)
    }

    /// Returns the tenant owned by an organization admin.
    pub async fn tenant_for(&self, organization_admin: AccountId) -> AppResult<Option<TenantId>> {
        Ok(self
            .ports
            .tenants
            .find_by_organization(organization_admin)
            .await?
            .map(|record| record.tenant_id()))
    }

    /// Returns a tenant record by tenant handle.
    pub async fn tenant_record(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>> {
        self.ports.tenants.find_by_tenant(tenant_id).await
    }

    /// Reports where a tenant's subscription stands now.
    pub async fn subscription_status(
        &self,
        organization_admin: AccountId,
    ) -> AppResult<SubscriptionStatus> {
        let record = self.require_record(organization_admin).await?;
        Ok(record.subscription_status(self.clock.now(), self.settings.grace_period))
    }

    /// Lists every tenant record. Platform admins only.
    pub async fn list_tenants(&self, context: &CallContext) -> AppResult<Vec<TenantRecord>> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;
        self.ports.tenants.list().await
    }

    /// Returns the platform treasury balance.
    pub async fn platform_balance(&self) -> AppResult<u64> {
        self.ports.treasury.balance().await
    }

    async fn require_record(&self, organization_admin: AccountId) -> AppResult<TenantRecord> {
        self.ports
            .tenants
            .find_by_organization(organization_admin)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "organization '{organization_admin}' has no provisioned tenant"
                ))
            })
    }

    async fn record_lifecycle_event(
        &self,
        context: &CallContext,
        record: &TenantRecord,
        action: AuditAction,
        detail: Option<String>,
    ) {
        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: Some(record.tenant_id()),
                subject: context.caller(),
                action,
                resource_type: "tenant".to_owned(),
                resource_id: record.organization_admin().to_string(),
                detail,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests;
