use campusly_application::FeeSyncOutcome;
use campusly_domain::{FeeFields, FeeStructure};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming fee numbers for a default or custom schedule.
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/fee-structure-request.ts"
)]
pub struct FeeStructureRequest {
    #[ts(type = "number")]
    pub program_creation_fee: u64,
    #[ts(type = "number")]
    pub subscription_fee: u64,
    #[ts(type = "number")]
    pub certificate_fee: u64,
    pub revenue_share_percent: u8,
}

impl From<FeeStructureRequest> for FeeFields {
    fn from(value: FeeStructureRequest) -> Self {
        Self {
            program_creation_fee: value.program_creation_fee,
            subscription_fee: value.subscription_fee,
            certificate_fee: value.certificate_fee,
            revenue_share_percent: value.revenue_share_percent,
        }
    }
}

/// API representation of a resolved fee schedule.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/fee-structure-response.ts"
)]
pub struct FeeStructureResponse {
    #[ts(type = "number")]
    pub program_creation_fee: u64,
    #[ts(type = "number")]
    pub subscription_fee: u64,
    #[ts(type = "number")]
    pub certificate_fee: u64,
    pub revenue_share_percent: u8,
    pub is_custom: bool,
}

impl From<FeeStructure> for FeeStructureResponse {
    fn from(value: FeeStructure) -> Self {
        Self {
            program_creation_fee: value.program_creation_fee(),
            subscription_fee: value.subscription_fee(),
            certificate_fee: value.certificate_fee(),
            revenue_share_percent: value.revenue_share_percent(),
            is_custom: value.is_custom(),
        }
    }
}

/// Outcome of pushing fee numbers to a tenant instance.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/fee-sync-response.ts"
)]
pub struct FeeSyncResponse {
    pub synced: bool,
    pub structure: Option<FeeStructureResponse>,
    pub reason: Option<String>,
}

impl From<FeeSyncOutcome> for FeeSyncResponse {
    fn from(value: FeeSyncOutcome) -> Self {
        match value {
            FeeSyncOutcome::Synced(structure) => Self {
                synced: true,
                structure: Some(FeeStructureResponse::from(structure)),
                reason: None,
            },
            FeeSyncOutcome::Failed { reason } => Self {
                synced: false,
                structure: None,
                reason: Some(reason),
            },
        }
    }
}
