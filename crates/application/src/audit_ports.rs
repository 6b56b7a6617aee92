use async_trait::async_trait;
use campusly_core::{AccountId, AppResult, TenantId};
use campusly_domain::AuditAction;
use tracing::warn;

/// Canonical audit event payload emitted by application use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant the event belongs to, `None` for platform-wide events.
    pub tenant_id: Option<TenantId>,
    /// Account that performed the action.
    pub subject: AccountId,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Resource kind targeted by the action.
    pub resource_type: String,
    /// Stable resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Appends an event for an operation whose effects are already committed.
/// A failure here is logged instead of failing the committed operation.
pub(crate) async fn append_committed_event(repository: &dyn AuditRepository, event: AuditEvent) {
    let action = event.action;
    let resource_id = event.resource_id.clone();

    if let Err(error) = repository.append_event(event).await {
        warn!(
            action = action.as_str(),
            resource_id = %resource_id,
            error = %error,
            "failed to append audit event for committed operation"
        );
    }
}
