//! Process-local stand-in for the per-tenant service instances.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use campusly_application::{
    AccountDirectory, AccountKind, FeeSyncTarget, InstanceHandle, InstanceKind,
    InstanceProvisioner, ServiceWiring, TenantProfileService,
};
use campusly_core::{AccountId, AppError, AppResult, TenantId};
use campusly_domain::{FeeStructure, Role};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct SimulatedInstance {
    handle: InstanceHandle,
    wiring: Option<ServiceWiring>,
    local_roles: HashSet<(Role, AccountId)>,
    cached_fees: Option<FeeStructure>,
}

/// Clones tenant instances in memory, keeps school profiles and knows which
/// accounts are programs.
#[derive(Debug, Default)]
pub struct SimulatedTenantRuntime {
    instances: RwLock<HashMap<AccountId, SimulatedInstance>>,
    active_schools: RwLock<HashSet<TenantId>>,
    programs: RwLock<HashSet<AccountId>>,
}

impl SimulatedTenantRuntime {
    /// Creates a runtime with no instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an account as controlled by a program.
    pub async fn register_program(&self, account: AccountId) {
        self.programs.write().await.insert(account);
    }

    /// Returns the live instances of a tenant.
    pub async fn instances_of(&self, tenant_id: TenantId) -> Vec<InstanceHandle> {
        let mut handles: Vec<InstanceHandle> = self
            .instances
            .read()
            .await
            .values()
            .filter(|instance| instance.handle.tenant_id == tenant_id)
            .map(|instance| instance.handle)
            .collect();
        handles.sort_by_key(|handle| handle.kind);
        handles
    }

    /// Returns the fee schedule last pushed to a tenant's root instance.
    pub async fn cached_fees(&self, tenant_id: TenantId) -> Option<FeeStructure> {
        self.instances
            .read()
            .await
            .get(&tenant_id.as_account())
            .and_then(|instance| instance.cached_fees)
    }

    /// Returns whether the tenant's school profile is active.
    pub async fn is_school_active(&self, tenant_id: TenantId) -> bool {
        self.active_schools.read().await.contains(&tenant_id)
    }
}

#[async_trait]
impl InstanceProvisioner for SimulatedTenantRuntime {
    async fn clone_template(
        &self,
        kind: InstanceKind,
        tenant_id: TenantId,
    ) -> AppResult<InstanceHandle> {
        let address = match kind {
            InstanceKind::TenantRoot => tenant_id.as_account(),
            _ => AccountId::new(),
        };

        let mut instances = self.instances.write().await;
        if instances.contains_key(&address) {
            return Err(AppError::Conflict(format!(
                "instance '{address}' already exists"
            )));
        }

        let handle = InstanceHandle {
            kind,
            tenant_id,
            address,
        };
        instances.insert(
            address,
            SimulatedInstance {
                handle,
                wiring: None,
                local_roles: HashSet::new(),
                cached_fees: None,
            },
        );

        debug!(tenant_id = %tenant_id, kind = %kind, address = %address, "instance cloned");
        Ok(handle)
    }

    async fn initialize(&self, instance: &InstanceHandle, wiring: &ServiceWiring) -> AppResult<()> {
        let mut instances = self.instances.write().await;
        let stored = instances
            .get_mut(&instance.address)
            .ok_or_else(|| AppError::Conflict(format!("instance '{}' is gone", instance.address)))?;

        if stored.wiring.is_some() {
            return Err(AppError::Conflict(format!(
                "instance '{}' is already initialized",
                instance.address
            )));
        }

        stored.wiring = Some(*wiring);
        Ok(())
    }

    async fn grant_role(
        &self,
        instance: &InstanceHandle,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        let mut instances = self.instances.write().await;
        let stored = instances
            .get_mut(&instance.address)
            .ok_or_else(|| AppError::Conflict(format!("instance '{}' is gone", instance.address)))?;

        stored.local_roles.insert((role, account));
        Ok(())
    }

    async fn retire(&self, instance: &InstanceHandle) -> AppResult<()> {
        self.instances.write().await.remove(&instance.address);
        debug!(address = %instance.address, kind = %instance.kind, "instance retired");
        Ok(())
    }
}

#[async_trait]
impl FeeSyncTarget for SimulatedTenantRuntime {
    async fn push_fee_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()> {
        let mut instances = self.instances.write().await;
        let root = instances.get_mut(&tenant_id.as_account()).ok_or_else(|| {
            AppError::Conflict(format!("tenant '{tenant_id}' has no live root instance"))
        })?;

        root.cached_fees = Some(structure);
        Ok(())
    }
}

#[async_trait]
impl TenantProfileService for SimulatedTenantRuntime {
    async fn activate_school(&self, tenant_id: TenantId) -> AppResult<()> {
        if !self.active_schools.write().await.insert(tenant_id) {
            return Err(AppError::Conflict(format!(
                "school of tenant '{tenant_id}' is already active"
            )));
        }

        Ok(())
    }

    async fn deactivate_school(&self, tenant_id: TenantId) -> AppResult<()> {
        self.active_schools.write().await.remove(&tenant_id);
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for SimulatedTenantRuntime {
    async fn account_kind(&self, account: AccountId) -> AppResult<AccountKind> {
        if self.programs.read().await.contains(&account)
            || self.instances.read().await.contains_key(&account)
        {
            return Ok(AccountKind::Program);
        }

        Ok(AccountKind::Individual)
    }
}
