use std::sync::Arc;

use campusly_application::{
    Clock, FeeCollectionService, RateLimitService, RevenueAccount, RoleRegistry, TenantFactory,
    TenantGate, TenantGatePorts,
};
use campusly_core::TenantId;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_registry: RoleRegistry,
    pub revenue_account: RevenueAccount,
    pub tenant_factory: TenantFactory,
    pub fee_collection: FeeCollectionService,
    pub rate_limit_service: RateLimitService,
    pub gate_ports: TenantGatePorts,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Builds the gate of one tenant instance.
    pub fn gate(&self, tenant_id: TenantId) -> TenantGate {
        TenantGate::new(
            tenant_id,
            self.gate_ports.clone(),
            self.role_registry.clone(),
            self.rate_limit_service.clone(),
            self.clock.clone(),
        )
    }
}
