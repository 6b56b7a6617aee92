//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod clock;
mod fee_collection_service;
mod payment_ports;
mod rate_limit_service;
mod revenue_account;
mod revenue_ports;
mod role_registry;
mod settings;
mod tenant_factory;
mod tenant_gate;
mod tenant_ports;

#[cfg(test)]
mod test_fakes;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use clock::Clock;
pub use fee_collection_service::FeeCollectionService;
pub use payment_ports::{FundsTransfer, PlatformTreasury};
pub use rate_limit_service::{RateLimitRepository, RateLimitRule, RateLimitService};
pub use revenue_account::{FeeSyncOutcome, PaymentInput, RevenueAccount, RevenueAccountPorts};
pub use revenue_ports::{FeeScheduleRepository, FeeSyncTarget, RevenueLedgerRepository};
pub use role_registry::{RoleRegistry, RoleRepository};
pub use settings::{PlatformSettings, ProvisioningLimits, ServiceWiring};
pub use tenant_factory::{
    PlannedGrant, ProvisioningPlan, TenantFactory, TenantFactoryPorts, validate_provisioning,
};
pub use tenant_gate::{TenantGate, TenantGatePorts};
pub use tenant_ports::{
    AccountDirectory, AccountKind, InstanceHandle, InstanceKind, InstanceProvisioner,
    InstanceStatusRepository, TenantProfileService, TenantRepository,
};
