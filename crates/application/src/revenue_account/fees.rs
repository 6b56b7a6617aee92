use campusly_core::{AppError, AppResult, CallContext, TenantId};
use campusly_domain::{AuditAction, FeeFields, FeeStructure};
use tracing::{info, warn};

use crate::AuditEvent;
use crate::audit_ports::append_committed_event;

use super::{FeeSyncOutcome, RevenueAccount};

impl RevenueAccount {
    /// Resolves the tenant's schedule: its override when one exists, the
    /// platform default otherwise.
    pub async fn fee_structure(&self, tenant_id: TenantId) -> AppResult<FeeStructure> {
        match self
            .ports
            .fee_schedules
            .find_custom_structure(tenant_id)
            .await?
        {
            Some(structure) => Ok(structure),
            None => self.default_fee_structure().await,
        }
    }

    /// Returns the platform default schedule.
    pub async fn default_fee_structure(&self) -> AppResult<FeeStructure> {
        match self.ports.fee_schedules.find_default_structure().await? {
            Some(structure) => Ok(structure),
            None => FeeStructure::platform_default(self.default_fees),
        }
    }

    /// Returns the certificate fee that applies to a tenant.
    pub async fn certificate_fee(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self.fee_structure(tenant_id).await?.certificate_fee())
    }

    /// Returns the program creation fee that applies to a tenant.
    pub async fn program_creation_fee(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self.fee_structure(tenant_id).await?.program_creation_fee())
    }

    /// Returns the subscription fee that applies to a tenant.
    pub async fn subscription_fee(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self.fee_structure(tenant_id).await?.subscription_fee())
    }

    /// Stores a tenant override. The revenue share must stay below 100.
    pub async fn set_custom_fee_structure(
        &self,
        context: &CallContext,
        tenant_id: TenantId,
        fields: FeeFields,
    ) -> AppResult<FeeStructure> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;

        if tenant_id.is_nil() {
            return Err(AppError::Validation(
                "tenant must not be the null identity".to_owned(),
            ));
        }

        let structure = FeeStructure::custom(fields)?;
        self.ports
            .fee_schedules
            .save_custom_structure(tenant_id, structure)
            .await?;

        info!(
            tenant_id = %tenant_id,
            revenue_share_percent = structure.revenue_share_percent(),
            "custom fee structure stored"
        );
        self.record_fee_change(
            context,
            Some(tenant_id),
            AuditAction::CustomFeeStructureUpdated,
            structure,
        )
        .await;

        Ok(structure)
    }

    /// Replaces the platform default. A revenue share of exactly 100 is
    /// accepted.
    pub async fn update_default_fee_structure(
        &self,
        context: &CallContext,
        fields: FeeFields,
    ) -> AppResult<FeeStructure> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;

        let structure = FeeStructure::platform_default(fields)?;
        self.ports
            .fee_schedules
            .save_default_structure(structure)
            .await?;

        info!(
            revenue_share_percent = structure.revenue_share_percent(),
            "default fee structure updated"
        );
        self.record_fee_change(
            context,
            None,
            AuditAction::DefaultFeeStructureUpdated,
            structure,
        )
        .await;

        Ok(structure)
    }

    /// Drops a tenant override so the default applies again. Returns
    /// whether an override existed.
    pub async fn clear_custom_fee_structure(
        &self,
        context: &CallContext,
        tenant_id: TenantId,
    ) -> AppResult<bool> {
        self.role_registry
            .require_platform_admin(context.caller())
            .await?;

        let removed = self
            .ports
            .fee_schedules
            .remove_custom_structure(tenant_id)
            .await?;

        if removed {
            info!(tenant_id = %tenant_id, "custom fee structure cleared");
            let structure = self.default_fee_structure().await?;
            self.record_fee_change(
                context,
                Some(tenant_id),
                AuditAction::CustomFeeStructureUpdated,
                structure,
            )
            .await;
        }

        Ok(removed)
    }

    /// Pushes the resolved schedule to the tenant's instance.
    ///
    /// A failed push does not fail the call; it is reported as
    /// [`FeeSyncOutcome::Failed`].
    pub async fn sync_fee_structure(
        &self,
        context: &CallContext,
        tenant_id: TenantId,
    ) -> AppResult<FeeSyncOutcome> {
        if !self
            .role_registry
            .is_platform_admin(context.caller())
            .await?
        {
            self.require_tenant_administrator(context.caller(), tenant_id)
                .await?;
        }

        let structure = self.fee_structure(tenant_id).await?;
        match self
            .ports
            .fee_sync
            .push_fee_structure(tenant_id, structure)
            .await
        {
            Ok(()) => {
                info!(tenant_id = %tenant_id, "fee structure synced to tenant instance");
                Ok(FeeSyncOutcome::Synced(structure))
            }
            Err(error) => {
                let reason = error.to_string();
                warn!(tenant_id = %tenant_id, error = %reason, "fee structure sync failed");

                append_committed_event(
                    self.ports.audit.as_ref(),
                    AuditEvent {
                        tenant_id: Some(tenant_id),
                        subject: context.caller(),
                        action: AuditAction::FeeSyncFailed,
                        resource_type: "fee_structure".to_owned(),
                        resource_id: tenant_id.to_string(),
                        detail: Some(reason.clone()),
                    },
                )
                .await;

                Ok(FeeSyncOutcome::Failed { reason })
            }
        }
    }

    async fn record_fee_change(
        &self,
        context: &CallContext,
        tenant_id: Option<TenantId>,
        action: AuditAction,
        structure: FeeStructure,
    ) {
        let fields = structure.fields();
        append_committed_event(
            self.ports.audit.as_ref(),
            AuditEvent {
                tenant_id,
                subject: context.caller(),
                action,
                resource_type: "fee_structure".to_owned(),
                resource_id: tenant_id.map_or_else(|| "default".to_owned(), |id| id.to_string()),
                detail: Some(format!(
                    "program_creation_fee={} subscription_fee={} certificate_fee={} revenue_share_percent={}",
                    fields.program_creation_fee,
                    fields.subscription_fee,
                    fields.certificate_fee,
                    fields.revenue_share_percent
                )),
            },
        )
        .await;
    }
}
