use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use campusly_core::{AccountId, AppResult, TenantId};
use campusly_domain::{InstanceStatus, Role, TenantRecord};

use crate::ServiceWiring;

/// Repository port for tenant records. Records are never deleted.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Finds the tenant owned by an organization admin.
    async fn find_by_organization(
        &self,
        organization_admin: AccountId,
    ) -> AppResult<Option<TenantRecord>>;

    /// Finds a tenant by its handle.
    async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>>;

    /// Stores a new record. Fails with `Conflict` when the organization
    /// admin already owns a record.
    async fn insert_if_absent(&self, record: TenantRecord) -> AppResult<()>;

    /// Replaces `previous` with `next`. Fails with `Conflict` when the stored
    /// record no longer equals `previous`.
    async fn replace(&self, previous: &TenantRecord, next: TenantRecord) -> AppResult<()>;

    /// Lists all records ordered by provisioning time.
    async fn list(&self) -> AppResult<Vec<TenantRecord>>;
}

/// Service templates cloned for every tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceKind {
    /// Tenant root. Acts under the tenant's own account.
    TenantRoot,
    /// Program catalog service.
    ProgramCatalog,
    /// Attendance tracking service.
    AttendanceTracker,
    /// Certificate issuing service.
    CertificateIssuer,
}

impl InstanceKind {
    /// Every template in cloning order, tenant root first.
    pub const ALL: [Self; 4] = [
        Self::TenantRoot,
        Self::ProgramCatalog,
        Self::AttendanceTracker,
        Self::CertificateIssuer,
    ];

    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantRoot => "tenant_root",
            Self::ProgramCatalog => "program_catalog",
            Self::AttendanceTracker => "attendance_tracker",
            Self::CertificateIssuer => "certificate_issuer",
        }
    }
}

impl Display for InstanceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A cloned service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    /// Template the instance was cloned from.
    pub kind: InstanceKind,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Identity the instance acts under.
    pub address: AccountId,
}

/// Port that clones and wires per-tenant service instances.
#[async_trait]
pub trait InstanceProvisioner: Send + Sync {
    /// Clones one template for a tenant. The tenant root must be addressed
    /// by `tenant_id.as_account()`.
    async fn clone_template(
        &self,
        kind: InstanceKind,
        tenant_id: TenantId,
    ) -> AppResult<InstanceHandle>;

    /// Hands the instance its service references.
    async fn initialize(&self, instance: &InstanceHandle, wiring: &ServiceWiring) -> AppResult<()>;

    /// Grants a role on the instance's local access list.
    async fn grant_role(
        &self,
        instance: &InstanceHandle,
        role: Role,
        account: AccountId,
    ) -> AppResult<()>;

    /// Discards an instance created by a provisioning attempt that failed.
    async fn retire(&self, instance: &InstanceHandle) -> AppResult<()>;
}

/// Tenant profile collaborator.
#[async_trait]
pub trait TenantProfileService: Send + Sync {
    /// Marks the tenant's school profile active.
    async fn activate_school(&self, tenant_id: TenantId) -> AppResult<()>;

    /// Reverts an activation made by a provisioning attempt that failed.
    async fn deactivate_school(&self, tenant_id: TenantId) -> AppResult<()>;
}

/// What kind of controller stands behind an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    /// Controlled by a person.
    Individual,
    /// A deployed program or service instance.
    Program,
}

/// Resolves account kinds.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns the kind of controller behind an account.
    async fn account_kind(&self, account: AccountId) -> AppResult<AccountKind>;
}

/// Repository port for the per-tenant kill switch.
#[async_trait]
pub trait InstanceStatusRepository: Send + Sync {
    /// Returns the tenant's status, `Active` when none was stored.
    async fn find_status(&self, tenant_id: TenantId) -> AppResult<InstanceStatus>;

    /// Moves from `expected` to `next`. Returns `false` when the stored
    /// status differs from `expected`.
    async fn transition(
        &self,
        tenant_id: TenantId,
        expected: InstanceStatus,
        next: InstanceStatus,
    ) -> AppResult<bool>;
}
