//! Kill switch and rate limit state in PostgreSQL.

use async_trait::async_trait;
use campusly_application::{InstanceStatusRepository, RateLimitRepository};
use campusly_core::{AppError, AppResult, TenantId};
use campusly_domain::{InstanceStatus, RateLimitPolicy, RateLimitWindow};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::postgres_values::internal;

/// PostgreSQL implementation of the instance status and rate limit ports.
#[derive(Clone)]
pub struct PostgresGuardRepository {
    pool: PgPool,
}

impl PostgresGuardRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstanceStatusRepository for PostgresGuardRepository {
    async fn find_status(&self, tenant_id: TenantId) -> AppResult<InstanceStatus> {
        let stored = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM tenant_instance_status
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("read instance status"))?;

        stored.map_or(Ok(InstanceStatus::default()), |status| {
            InstanceStatus::parse(status.as_str())
        })
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        expected: InstanceStatus,
        next: InstanceStatus,
    ) -> AppResult<bool> {
        // A missing row reads as the default status, so only that transition
        // may create one.
        let result = if expected == InstanceStatus::default() {
            sqlx::query(
                r#"
                INSERT INTO tenant_instance_status (tenant_id, status)
                VALUES ($1, $2)
                ON CONFLICT (tenant_id) DO UPDATE
                SET status = EXCLUDED.status, changed_at = now()
                WHERE tenant_instance_status.status = $3
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(next.as_str())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE tenant_instance_status
                SET status = $2, changed_at = now()
                WHERE tenant_id = $1 AND status = $3
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(next.as_str())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
        }
        .map_err(internal("transition instance status"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RateLimitRepository for PostgresGuardRepository {
    async fn record_event(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitWindow> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO rate_limit_windows (key)
            VALUES ($1)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .execute(&mut *transaction)
        .await
        .map_err(internal("create rate limit window"))?;

        let row = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT last_event_at, window_started_at, event_count
            FROM rate_limit_windows
            WHERE key = $1
            FOR UPDATE
            "#,
        )
        .bind(key)
        .fetch_one(&mut *transaction)
        .await
        .map_err(internal("lock rate limit window"))?;

        let mut window = RateLimitWindow {
            last_event_at: row.last_event_at,
            window_started_at: row.window_started_at,
            count: u32::try_from(row.event_count).map_err(|_| {
                AppError::Internal(format!("stored event count {} is negative", row.event_count))
            })?,
        };
        window.admit(policy, now)?;

        sqlx::query(
            r#"
            UPDATE rate_limit_windows
            SET last_event_at = $2, window_started_at = $3, event_count = $4
            WHERE key = $1
            "#,
        )
        .bind(key)
        .bind(window.last_event_at)
        .bind(window.window_started_at)
        .bind(i32::try_from(window.count).unwrap_or(i32::MAX))
        .execute(&mut *transaction)
        .await
        .map_err(internal("record rate limited event"))?;

        transaction
            .commit()
            .await
            .map_err(internal("commit rate limit window"))?;

        Ok(window)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_windows
            WHERE last_event_at IS NULL OR last_event_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(internal("clean up rate limit windows"))?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowRow {
    last_event_at: Option<DateTime<Utc>>,
    window_started_at: Option<DateTime<Utc>>,
    event_count: i32,
}
