use campusly_core::{AccountId, AppError, AppResult, CallContext, ProgramId, TenantId};
use campusly_domain::{
    AuditAction, FixedFeeKind, RevenueLedger, RevenueSplit, Role, RoleScope,
    TenantShareWithdrawal,
};
use tracing::{info, warn};

use crate::AuditEvent;
use crate::audit_ports::append_committed_event;

use super::{PaymentInput, RevenueAccount};

impl RevenueAccount {
    /// Splits a payment between the platform and the tenant and records it
    /// against the program it pays for.
    pub async fn process_payment(
        &self,
        context: &CallContext,
        input: PaymentInput,
    ) -> AppResult<RevenueSplit> {
        if input.amount == 0 {
            return Err(AppError::Validation(
                "payment amount must be greater than zero".to_owned(),
            ));
        }

        if input.payer.is_nil() {
            return Err(AppError::Validation(
                "payer must not be the null identity".to_owned(),
            ));
        }

        let scope = RoleScope::Tenant(input.tenant_id);
        self.role_registry
            .require(Role::Tenant, context.caller(), scope)
            .await?;
        self.ensure_billable_tenant(input.tenant_id).await?;

        if context.attached_value() != input.amount {
            return Err(AppError::Payment(format!(
                "attached value {} does not match payment amount {}",
                context.attached_value(),
                input.amount
            )));
        }

        let structure = self.fee_structure(input.tenant_id).await?;
        let split = structure.split(input.amount);

        let mut ledger = self
            .ports
            .ledgers
            .find_ledger(input.tenant_id)
            .await?
            .unwrap_or_else(|| RevenueLedger::empty(input.tenant_id));
        ledger.record_split(input.program_id, split)?;

        if split.platform_share > 0 {
            self.ports.treasury.credit(split.platform_share).await?;
        }

        if let Err(error) = self.ports.ledgers.save_ledger(&ledger).await {
            if split.platform_share > 0
                && let Err(reversal_error) = self.ports.treasury.debit(split.platform_share).await
            {
                warn!(
                    tenant_id = %input.tenant_id,
                    amount = split.platform_share,
                    error = %reversal_error,
                    "failed to reverse platform share after ledger save failure"
                );
            }
            return Err(error);
        }

        info!(
            tenant_id = %input.tenant_id,
            program_id = %input.program_id,
            amount = split.amount,
            platform_share = split.platform_share,
            tenant_share = split.tenant_share,
            "revenue split recorded"
        );

        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: Some(input.tenant_id),
                subject: input.payer,
                action: AuditAction::RevenueSplitRecorded,
                resource_type: "program_revenue".to_owned(),
                resource_id: input.program_id.to_string(),
                detail: Some(format!(
                    "amount={} platform_share={} tenant_share={}",
                    split.amount, split.platform_share, split.tenant_share
                )),
            },
        )
        .await;

        Ok(split)
    }

    /// Collects a platform-only fixed fee. The whole attached value goes to
    /// the platform; nothing is split with the tenant. Returns the fee that
    /// was due.
    pub async fn issue_fixed_fee(
        &self,
        context: &CallContext,
        tenant_id: TenantId,
        kind: FixedFeeKind,
    ) -> AppResult<u64> {
        self.role_registry
            .require(Role::Tenant, context.caller(), RoleScope::Tenant(tenant_id))
            .await?;

        let fee = self.fee_structure(tenant_id).await?.fixed_fee(kind);
        if context.attached_value() < fee {
            return Err(AppError::Payment(format!(
                "{kind} fee of {fee} required, got {}",
                context.attached_value()
            )));
        }

        if context.attached_value() > 0 {
            self.ports
                .treasury
                .credit(context.attached_value())
                .await?;
        }

        info!(
            tenant_id = %tenant_id,
            kind = kind.as_str(),
            fee,
            collected = context.attached_value(),
            "fixed fee collected"
        );

        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: Some(tenant_id),
                subject: context.caller(),
                action: AuditAction::FixedFeeCollected,
                resource_type: "fixed_fee".to_owned(),
                resource_id: kind.as_str().to_owned(),
                detail: Some(format!("collected={}", context.attached_value())),
            },
        )
        .await;

        Ok(fee)
    }

    /// Pays out the tenant's accrued share.
    ///
    /// The ledger is zeroed and saved before the transfer runs. When the
    /// transfer fails the share is put back and the transfer error returned.
    pub async fn withdraw(
        &self,
        context: &CallContext,
        tenant_id: TenantId,
        recipient: AccountId,
    ) -> AppResult<u64> {
        self.require_tenant_administrator(context.caller(), tenant_id)
            .await?;

        if recipient.is_nil() {
            return Err(AppError::Validation(
                "withdrawal recipient must not be the null identity".to_owned(),
            ));
        }

        let mut ledger = self
            .ports
            .ledgers
            .find_ledger(tenant_id)
            .await?
            .ok_or_else(|| AppError::Conflict("no revenue to withdraw".to_owned()))?;

        let withdrawal =
            ledger.withdraw_tenant_share(self.clock.now(), self.withdrawal_cooldown)?;
        self.ports.ledgers.save_ledger(&ledger).await?;

        if let Err(error) = self
            .ports
            .funds_transfer
            .transfer(recipient, withdrawal.amount)
            .await
        {
            self.restore_failed_withdrawal(tenant_id, withdrawal).await;
            return Err(error);
        }

        info!(
            tenant_id = %tenant_id,
            recipient = %recipient,
            amount = withdrawal.amount,
            "tenant revenue withdrawn"
        );

        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id: Some(tenant_id),
                subject: context.caller(),
                action: AuditAction::RevenueWithdrawn,
                resource_type: "revenue_ledger".to_owned(),
                resource_id: tenant_id.to_string(),
                detail: Some(format!("amount={} recipient={recipient}", withdrawal.amount)),
            },
        )
        .await;

        Ok(withdrawal.amount)
    }

    /// Returns the tenant's ledger, empty when nothing was paid yet.
    pub async fn ledger(&self, tenant_id: TenantId) -> AppResult<RevenueLedger> {
        Ok(self
            .ports
            .ledgers
            .find_ledger(tenant_id)
            .await?
            .unwrap_or_else(|| RevenueLedger::empty(tenant_id)))
    }

    /// Returns the revenue attributed to one program of a tenant.
    pub async fn program_revenue(
        &self,
        tenant_id: TenantId,
        program_id: ProgramId,
    ) -> AppResult<u64> {
        Ok(self.ledger(tenant_id).await?.program_revenue(program_id))
    }

    async fn ensure_billable_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        let scope = RoleScope::Tenant(tenant_id);
        if !self
            .role_registry
            .check(Role::Tenant, tenant_id.as_account(), scope)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "tenant '{tenant_id}' does not hold a valid tenant capability"
            )));
        }

        let record = self
            .ports
            .tenants
            .find_by_tenant(tenant_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!("tenant '{tenant_id}' is not provisioned"))
            })?;

        if !record.is_subscription_current(self.clock.now()) {
            return Err(AppError::Conflict(format!(
                "tenant '{tenant_id}' has no active subscription"
            )));
        }

        Ok(())
    }

    // Re-reads the ledger so anything committed during the transfer is kept.
    async fn restore_failed_withdrawal(
        &self,
        tenant_id: TenantId,
        withdrawal: TenantShareWithdrawal,
    ) {
        let restored = async {
            let mut current = self
                .ports
                .ledgers
                .find_ledger(tenant_id)
                .await?
                .ok_or_else(|| AppError::Internal("revenue ledger disappeared".to_owned()))?;
            current.restore_withdrawal(withdrawal)?;
            self.ports.ledgers.save_ledger(&current).await
        }
        .await;

        match restored {
            Ok(_) => warn!(
                tenant_id = %tenant_id,
                amount = withdrawal.amount,
                "transfer failed, tenant share restored"
            ),
            Err(error) => warn!(
                tenant_id = %tenant_id,
                amount = withdrawal.amount,
                error = %error,
                "transfer failed and tenant share could not be restored"
            ),
        }
    }
}
