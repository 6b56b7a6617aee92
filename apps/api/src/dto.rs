mod common;
mod fees;
mod revenue;
mod roles;
mod tenants;

pub use common::{AmountResponse, HealthResponse, InstanceStatusResponse};
pub use fees::{FeeStructureRequest, FeeStructureResponse, FeeSyncResponse};
pub use revenue::{
    FixedFeeRequest, PaymentRequest, ProgramRevenueResponse, RevenueLedgerResponse,
    RevenueSplitResponse, RevenueWithdrawalRequest, TuitionRequest,
};
pub use roles::{MemberRoleRequest, RoleGrantRequest, RoleGrantResponse};
pub use tenants::{
    DeploymentConfigRequest, PlatformBalanceResponse, PlatformWithdrawalRequest,
    ProvisionTenantRequest, SubscriptionStatusResponse, TenantResponse,
};
