use async_trait::async_trait;
use campusly_application::{AuditEvent, AuditRepository};
use campusly_core::{AccountId, AppResult, TenantId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_values::internal;

/// One persisted audit row with its storage timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuditEvent {
    /// Account that performed the action.
    pub subject: AccountId,
    /// Stable action identifier as stored.
    pub action: String,
    /// Resource identifier the action targeted.
    pub resource_id: String,
    /// Optional detail payload.
    pub detail: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct AuditRow {
    subject: Uuid,
    action: String,
    resource_id: String,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

/// Audit log stored in `audit_events`. Platform-wide events carry a NULL
/// tenant.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns up to `limit` events of one tenant, newest first, or the
    /// platform-wide events when `tenant_id` is `None`.
    pub async fn recent_events(
        &self,
        tenant_id: Option<TenantId>,
        limit: i64,
    ) -> AppResult<Vec<StoredAuditEvent>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT subject, action, resource_id, detail, created_at
            FROM audit_events
            WHERE tenant_id IS NOT DISTINCT FROM $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list audit events"))?;

        Ok(rows
            .into_iter()
            .map(|row| StoredAuditEvent {
                subject: AccountId::from_uuid(row.subject),
                action: row.action,
                resource_id: row.resource_id,
                detail: row.detail,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events
                (tenant_id, subject, action, resource_type, resource_id, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(event.subject.as_uuid())
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(internal("append audit event"))?;

        Ok(())
    }
}
