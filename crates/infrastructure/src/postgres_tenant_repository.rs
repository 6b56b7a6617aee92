use async_trait::async_trait;
use campusly_application::TenantRepository;
use campusly_core::{AccountId, AppError, AppResult, TenantId};
use campusly_domain::TenantRecord;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::postgres_values::internal;

/// PostgreSQL-backed tenant record store.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_TENANT: &str = r#"
    SELECT
        tenant_id,
        organization_admin,
        deployed,
        active,
        subscription_end,
        subscription_duration_seconds,
        provisioned_at
    FROM tenants
"#;

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_by_organization(
        &self,
        organization_admin: AccountId,
    ) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "{SELECT_TENANT} WHERE organization_admin = $1"
        ))
        .bind(organization_admin.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find tenant by organization"))?;

        Ok(row.map(TenantRow::into_record))
    }

    async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!("{SELECT_TENANT} WHERE tenant_id = $1"))
            .bind(tenant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal("find tenant"))?;

        Ok(row.map(TenantRow::into_record))
    }

    async fn insert_if_absent(&self, record: TenantRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (
                tenant_id,
                organization_admin,
                deployed,
                active,
                subscription_end,
                subscription_duration_seconds,
                provisioned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(record.tenant_id().as_uuid())
        .bind(record.organization_admin().as_uuid())
        .bind(record.deployed())
        .bind(record.active())
        .bind(record.subscription_end())
        .bind(record.subscription_duration().num_seconds())
        .bind(record.provisioned_at())
        .execute(&self.pool)
        .await
        .map_err(internal("insert tenant"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "organization '{}' already has a tenant",
                record.organization_admin()
            )));
        }

        Ok(())
    }

    async fn replace(&self, previous: &TenantRecord, next: TenantRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET
                deployed = $3,
                active = $4,
                subscription_end = $5,
                subscription_duration_seconds = $6
            WHERE tenant_id = $1
              AND organization_admin = $2
              AND deployed = $7
              AND active = $8
              AND subscription_end = $9
              AND subscription_duration_seconds = $10
            "#,
        )
        .bind(previous.tenant_id().as_uuid())
        .bind(previous.organization_admin().as_uuid())
        .bind(next.deployed())
        .bind(next.active())
        .bind(next.subscription_end())
        .bind(next.subscription_duration().num_seconds())
        .bind(previous.deployed())
        .bind(previous.active())
        .bind(previous.subscription_end())
        .bind(previous.subscription_duration().num_seconds())
        .execute(&self.pool)
        .await
        .map_err(internal("update tenant"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "tenant '{}' was modified concurrently",
                previous.tenant_id()
            )));
        }

        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "{SELECT_TENANT} ORDER BY provisioned_at, tenant_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list tenants"))?;

        Ok(rows.into_iter().map(TenantRow::into_record).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    tenant_id: Uuid,
    organization_admin: Uuid,
    deployed: bool,
    active: bool,
    subscription_end: DateTime<Utc>,
    subscription_duration_seconds: i64,
    provisioned_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_record(self) -> TenantRecord {
        TenantRecord::restore(
            TenantId::from_uuid(self.tenant_id),
            AccountId::from_uuid(self.organization_admin),
            self.deployed,
            self.active,
            self.subscription_end,
            Duration::seconds(self.subscription_duration_seconds),
            self.provisioned_at,
        )
    }
}
