//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod fee;
mod guard;
mod ledger;
mod security;
mod tenant;

pub use fee::{
    DeploymentConfig, FeeFields, FeeStructure, FixedFeeKind, MAX_REVENUE_SHARE_PERCENT,
    RevenueSplit,
};
pub use guard::{InstanceStatus, RateLimitPolicy, RateLimitWindow};
pub use ledger::{RevenueLedger, TenantShareWithdrawal};
pub use security::{AuditAction, Role, RoleGrant, RoleScope};
pub use tenant::{SubscriptionStatus, TenantLifecycle, TenantRecord};
