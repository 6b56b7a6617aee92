use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Amount moved by a withdrawal or fee collection.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/amount-response.ts"
)]
pub struct AmountResponse {
    #[ts(type = "number")]
    pub amount: u64,
}

/// Kill switch state of a tenant instance.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/instance-status-response.ts"
)]
pub struct InstanceStatusResponse {
    pub status: String,
}
