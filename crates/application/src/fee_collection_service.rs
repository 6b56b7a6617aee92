//! Tenant-scoped fee collection on top of the gate and the revenue account.

use campusly_core::{AppResult, CallContext, ProgramId};
use campusly_domain::{FixedFeeKind, RateLimitPolicy, RevenueSplit, Role};

use crate::{PaymentInput, RateLimitRule, RevenueAccount, TenantGate};

const TUITION_CATEGORY: &str = "tuition";
const PROGRAM_CREATION_CATEGORY: &str = "program_creation_fee";
const CERTIFICATE_CATEGORY: &str = "certificate_fee";

/// Collects tuition and fixed fees on behalf of a tenant instance.
#[derive(Clone)]
pub struct FeeCollectionService {
    revenue_account: RevenueAccount,
    policy: RateLimitPolicy,
}

impl FeeCollectionService {
    /// Creates the service. `policy` throttles every collection per caller.
    #[must_use]
    pub fn new(revenue_account: RevenueAccount, policy: RateLimitPolicy) -> Self {
        Self {
            revenue_account,
            policy,
        }
    }

    /// A student pays tuition for a program. The payment is split between
    /// the platform and the tenant.
    pub async fn collect_tuition(
        &self,
        gate: &TenantGate,
        context: &CallContext,
        program_id: ProgramId,
        amount: u64,
    ) -> AppResult<RevenueSplit> {
        gate.guard_mutation(context, &[Role::Student], &self.rule(TUITION_CATEGORY))
            .await?;

        self.revenue_account
            .process_payment(
                &context.forwarded_as(gate.tenant_id().as_account()),
                PaymentInput {
                    tenant_id: gate.tenant_id(),
                    payer: context.caller(),
                    program_id,
                    amount,
                },
            )
            .await
    }

    /// A teacher or tenant admin pays the program creation fee.
    pub async fn collect_program_creation_fee(
        &self,
        gate: &TenantGate,
        context: &CallContext,
    ) -> AppResult<u64> {
        self.collect_fixed_fee(
            gate,
            context,
            FixedFeeKind::ProgramCreation,
            PROGRAM_CREATION_CATEGORY,
        )
        .await
    }

    /// A teacher or tenant admin pays for issuing a certificate.
    pub async fn collect_certificate_fee(
        &self,
        gate: &TenantGate,
        context: &CallContext,
    ) -> AppResult<u64> {
        self.collect_fixed_fee(gate, context, FixedFeeKind::Certificate, CERTIFICATE_CATEGORY)
            .await
    }

    async fn collect_fixed_fee(
        &self,
        gate: &TenantGate,
        context: &CallContext,
        kind: FixedFeeKind,
        category: &str,
    ) -> AppResult<u64> {
        gate.guard_mutation(context, &[Role::Teacher, Role::Admin], &self.rule(category))
            .await?;

        self.revenue_account
            .issue_fixed_fee(
                &context.forwarded_as(gate.tenant_id().as_account()),
                gate.tenant_id(),
                kind,
            )
            .await
    }

    fn rule(&self, category: &str) -> RateLimitRule {
        RateLimitRule::new(category, self.policy)
    }
}
