use campusly_core::{AppError, AppResult, CallContext, TenantId};
use campusly_domain::TenantRecord;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{InstanceHandle, InstanceKind};

use super::{PlannedGrant, ProvisioningPlan, TenantFactory};

/// Undo action for one completed provisioning step.
#[derive(Debug)]
enum Compensation {
    RetireInstance(InstanceHandle),
    RevokeRole(PlannedGrant),
    ClearCustomFees(TenantId),
    DeactivateProfile(TenantId),
    DebitTreasury(u64),
}

impl TenantFactory {
    /// Applies a plan. On failure every completed step is undone in reverse
    /// order and the original error is returned.
    pub(super) async fn execute(
        &self,
        plan: &ProvisioningPlan,
        now: DateTime<Utc>,
    ) -> AppResult<TenantRecord> {
        let record = TenantRecord::provisioned(
            plan.tenant_id,
            plan.organization_admin,
            now,
            plan.subscription_duration,
        )?;

        let mut completed = Vec::new();
        match self.apply_steps(plan, record, &mut completed).await {
            Ok(record) => Ok(record),
            Err(error) => {
                warn!(
                    tenant_id = %plan.tenant_id,
                    error = %error,
                    steps = completed.len(),
                    "provisioning failed, rolling back"
                );
                self.unwind(completed).await;
                Err(error)
            }
        }
    }

    async fn apply_steps(
        &self,
        plan: &ProvisioningPlan,
        record: TenantRecord,
        completed: &mut Vec<Compensation>,
    ) -> AppResult<TenantRecord> {
        let factory = CallContext::unpaid(self.settings.factory_account);

        let mut instances = Vec::with_capacity(plan.instances.len());
        for kind in &plan.instances {
            let instance = self
                .ports
                .instances
                .clone_template(*kind, plan.tenant_id)
                .await?;
            completed.push(Compensation::RetireInstance(instance));

            if instance.kind == InstanceKind::TenantRoot
                && instance.address != plan.tenant_id.as_account()
            {
                return Err(AppError::Internal(format!(
                    "tenant root for '{}' was cloned at unexpected address '{}'",
                    plan.tenant_id, instance.address
                )));
            }

            self.ports
                .instances
                .initialize(&instance, &plan.wiring)
                .await?;
            instances.push(instance);
        }

        for grant in &plan.role_grants {
            self.role_registry
                .grant_scoped(&factory, grant.role, grant.account, grant.scope)
                .await?;
            completed.push(Compensation::RevokeRole(*grant));

            if let Some(kind) = grant.mirror_on {
                let instance = instances
                    .iter()
                    .find(|instance| instance.kind == kind)
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "plan mirrors a grant on missing instance '{kind}'"
                        ))
                    })?;
                self.ports
                    .instances
                    .grant_role(instance, grant.role, grant.account)
                    .await?;
            }
        }

        if let Some(fields) = plan.custom_fees {
            self.revenue_account
                .set_custom_fee_structure(&factory, plan.tenant_id, fields)
                .await?;
            completed.push(Compensation::ClearCustomFees(plan.tenant_id));
        }

        self.ports.profiles.activate_school(plan.tenant_id).await?;
        completed.push(Compensation::DeactivateProfile(plan.tenant_id));

        if plan.payment > 0 {
            self.ports.treasury.credit(plan.payment).await?;
            completed.push(Compensation::DebitTreasury(plan.payment));
        }

        self.ports.tenants.insert_if_absent(record.clone()).await?;
        Ok(record)
    }

    async fn unwind(&self, completed: Vec<Compensation>) {
        let factory = CallContext::unpaid(self.settings.factory_account);

        for compensation in completed.into_iter().rev() {
            let result = match &compensation {
                Compensation::RetireInstance(instance) => {
                    self.ports.instances.retire(instance).await
                }
                Compensation::RevokeRole(grant) => {
                    self.role_registry
                        .revoke_scoped(&factory, grant.role, grant.account, grant.scope)
                        .await
                }
                Compensation::ClearCustomFees(tenant_id) => self
                    .revenue_account
                    .clear_custom_fee_structure(&factory, *tenant_id)
                    .await
                    .map(|_| ()),
                Compensation::DeactivateProfile(tenant_id) => {
                    self.ports.profiles.deactivate_school(*tenant_id).await
                }
                Compensation::DebitTreasury(amount) => {
                    self.ports.treasury.debit(*amount).await.map(|_| ())
                }
            };

            if let Err(error) = result {
                warn!(
                    compensation = ?compensation,
                    error = %error,
                    "provisioning compensation failed"
                );
            }
        }
    }
}
