use campusly_domain::{RevenueLedger, RevenueSplit};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payment routed through the revenue split.
///
/// `payer` defaults to the caller.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/payment-request.ts"
)]
pub struct PaymentRequest {
    pub payer: Option<String>,
    #[ts(type = "number")]
    pub program_id: u64,
    #[ts(type = "number")]
    pub amount: u64,
}

/// Incoming tuition payment made by a student.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/tuition-request.ts"
)]
pub struct TuitionRequest {
    #[ts(type = "number")]
    pub program_id: u64,
    #[ts(type = "number")]
    pub amount: u64,
}

/// Incoming platform-only fee collection.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/fixed-fee-request.ts"
)]
pub struct FixedFeeRequest {
    pub kind: String,
}

/// Incoming tenant share withdrawal.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/revenue-withdrawal-request.ts"
)]
pub struct RevenueWithdrawalRequest {
    pub recipient: String,
}

/// How one payment was split.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/revenue-split-response.ts"
)]
pub struct RevenueSplitResponse {
    #[ts(type = "number")]
    pub amount: u64,
    #[ts(type = "number")]
    pub platform_share: u64,
    #[ts(type = "number")]
    pub tenant_share: u64,
}

impl From<RevenueSplit> for RevenueSplitResponse {
    fn from(value: RevenueSplit) -> Self {
        Self {
            amount: value.amount,
            platform_share: value.platform_share,
            tenant_share: value.tenant_share,
        }
    }
}

/// Revenue attributed to one program.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/program-revenue-response.ts"
)]
pub struct ProgramRevenueResponse {
    #[ts(type = "number")]
    pub program_id: u64,
    #[ts(type = "number")]
    pub amount: u64,
}

/// API representation of a tenant's revenue ledger.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/revenue-ledger-response.ts"
)]
pub struct RevenueLedgerResponse {
    pub tenant_id: String,
    #[ts(type = "number")]
    pub total_revenue: u64,
    #[ts(type = "number")]
    pub platform_share_accrued: u64,
    #[ts(type = "number")]
    pub tenant_share_accrued: u64,
    pub last_withdrawal_time: Option<String>,
    pub programs: Vec<ProgramRevenueResponse>,
}

impl From<RevenueLedger> for RevenueLedgerResponse {
    fn from(value: RevenueLedger) -> Self {
        Self {
            tenant_id: value.tenant_id().to_string(),
            total_revenue: value.total_revenue(),
            platform_share_accrued: value.platform_share_accrued(),
            tenant_share_accrued: value.tenant_share_accrued(),
            last_withdrawal_time: value.last_withdrawal_time().map(|time| time.to_rfc3339()),
            programs: value
                .programs()
                .iter()
                .map(|(program_id, amount)| ProgramRevenueResponse {
                    program_id: program_id.value(),
                    amount: *amount,
                })
                .collect(),
        }
    }
}
