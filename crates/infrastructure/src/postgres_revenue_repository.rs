use std::collections::BTreeMap;

use async_trait::async_trait;
use campusly_application::{FeeScheduleRepository, RevenueLedgerRepository};
use campusly_core::{AppError, AppResult, ProgramId, TenantId};
use campusly_domain::{FeeFields, FeeStructure, RevenueLedger};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::postgres_values::{from_bigint, internal, scope_key, to_bigint};

/// PostgreSQL-backed fee schedules and revenue ledgers.
#[derive(Clone)]
pub struct PostgresRevenueRepository {
    pool: PgPool,
}

impl PostgresRevenueRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_structure(&self, key: Uuid) -> AppResult<Option<FeeStructure>> {
        let row = sqlx::query_as::<_, FeeScheduleRow>(
            r#"
            SELECT
                program_creation_fee,
                subscription_fee,
                certificate_fee,
                revenue_share_percent,
                is_custom
            FROM fee_schedules
            WHERE scope_tenant_id = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find fee schedule"))?;

        row.map(FeeScheduleRow::into_structure).transpose()
    }

    async fn upsert_structure(&self, key: Uuid, structure: FeeStructure) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fee_schedules (
                scope_tenant_id,
                program_creation_fee,
                subscription_fee,
                certificate_fee,
                revenue_share_percent,
                is_custom
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (scope_tenant_id) DO UPDATE
            SET
                program_creation_fee = EXCLUDED.program_creation_fee,
                subscription_fee = EXCLUDED.subscription_fee,
                certificate_fee = EXCLUDED.certificate_fee,
                revenue_share_percent = EXCLUDED.revenue_share_percent,
                is_custom = EXCLUDED.is_custom,
                updated_at = now()
            "#,
        )
        .bind(key)
        .bind(to_bigint(structure.program_creation_fee(), "program_creation_fee")?)
        .bind(to_bigint(structure.subscription_fee(), "subscription_fee")?)
        .bind(to_bigint(structure.certificate_fee(), "certificate_fee")?)
        .bind(i16::from(structure.revenue_share_percent()))
        .bind(structure.is_custom())
        .execute(&self.pool)
        .await
        .map_err(internal("save fee schedule"))?;

        Ok(())
    }
}

#[async_trait]
impl FeeScheduleRepository for PostgresRevenueRepository {
    async fn find_default_structure(&self) -> AppResult<Option<FeeStructure>> {
        self.find_structure(scope_key(None)).await
    }

    async fn save_default_structure(&self, structure: FeeStructure) -> AppResult<()> {
        self.upsert_structure(scope_key(None), structure).await
    }

    async fn find_custom_structure(&self, tenant_id: TenantId) -> AppResult<Option<FeeStructure>> {
        self.find_structure(scope_key(Some(tenant_id))).await
    }

    async fn save_custom_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()> {
        self.upsert_structure(scope_key(Some(tenant_id)), structure)
            .await
    }

    async fn remove_custom_structure(&self, tenant_id: TenantId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM fee_schedules
            WHERE scope_tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(internal("remove custom fee schedule"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RevenueLedgerRepository for PostgresRevenueRepository {
    async fn find_ledger(&self, tenant_id: TenantId) -> AppResult<Option<RevenueLedger>> {
        let Some(row) = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT
                total_revenue,
                platform_share_accrued,
                tenant_share_accrued,
                last_withdrawal_time,
                version
            FROM revenue_ledgers
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find revenue ledger"))?
        else {
            return Ok(None);
        };

        let program_rows = sqlx::query_as::<_, ProgramRevenueRow>(
            r#"
            SELECT program_id, amount
            FROM program_revenue
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal("load program revenue"))?;

        let mut programs = BTreeMap::new();
        for program in program_rows {
            programs.insert(
                ProgramId::new(from_bigint(program.program_id, "program_id")?),
                from_bigint(program.amount, "program revenue")?,
            );
        }

        Ok(Some(RevenueLedger::restore(
            tenant_id,
            from_bigint(row.total_revenue, "total_revenue")?,
            from_bigint(row.platform_share_accrued, "platform_share_accrued")?,
            from_bigint(row.tenant_share_accrued, "tenant_share_accrued")?,
            row.last_withdrawal_time,
            programs,
            from_bigint(row.version, "ledger version")?,
        )))
    }

    async fn save_ledger(&self, ledger: &RevenueLedger) -> AppResult<RevenueLedger> {
        let tenant_uuid = ledger.tenant_id().as_uuid();
        let expected_version = to_bigint(ledger.version(), "ledger version")?;
        let next_version = to_bigint(ledger.next_version(), "ledger version")?;
        let total_revenue = to_bigint(ledger.total_revenue(), "total_revenue")?;
        let platform_share = to_bigint(ledger.platform_share_accrued(), "platform_share_accrued")?;
        let tenant_share = to_bigint(ledger.tenant_share_accrued(), "tenant_share_accrued")?;

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        let result = if ledger.version() == 0 {
            sqlx::query(
                r#"
                INSERT INTO revenue_ledgers (
                    tenant_id,
                    total_revenue,
                    platform_share_accrued,
                    tenant_share_accrued,
                    last_withdrawal_time,
                    version
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (tenant_id) DO NOTHING
                "#,
            )
            .bind(tenant_uuid)
            .bind(total_revenue)
            .bind(platform_share)
            .bind(tenant_share)
            .bind(ledger.last_withdrawal_time())
            .bind(next_version)
            .execute(&mut *transaction)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE revenue_ledgers
                SET
                    total_revenue = $2,
                    platform_share_accrued = $3,
                    tenant_share_accrued = $4,
                    last_withdrawal_time = $5,
                    version = $6
                WHERE tenant_id = $1 AND version = $7
                "#,
            )
            .bind(tenant_uuid)
            .bind(total_revenue)
            .bind(platform_share)
            .bind(tenant_share)
            .bind(ledger.last_withdrawal_time())
            .bind(next_version)
            .bind(expected_version)
            .execute(&mut *transaction)
            .await
        }
        .map_err(internal("save revenue ledger"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "revenue ledger of tenant '{}' changed since version {}",
                ledger.tenant_id(),
                ledger.version()
            )));
        }

        for (program_id, amount) in ledger.programs() {
            sqlx::query(
                r#"
                INSERT INTO program_revenue (tenant_id, program_id, amount)
                VALUES ($1, $2, $3)
                ON CONFLICT (tenant_id, program_id) DO UPDATE
                SET amount = EXCLUDED.amount
                "#,
            )
            .bind(tenant_uuid)
            .bind(to_bigint(program_id.value(), "program_id")?)
            .bind(to_bigint(*amount, "program revenue")?)
            .execute(&mut *transaction)
            .await
            .map_err(internal("save program revenue"))?;
        }

        transaction
            .commit()
            .await
            .map_err(internal("commit revenue ledger"))?;

        Ok(RevenueLedger::restore(
            ledger.tenant_id(),
            ledger.total_revenue(),
            ledger.platform_share_accrued(),
            ledger.tenant_share_accrued(),
            ledger.last_withdrawal_time(),
            ledger.programs().clone(),
            ledger.next_version(),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeeScheduleRow {
    program_creation_fee: i64,
    subscription_fee: i64,
    certificate_fee: i64,
    revenue_share_percent: i16,
    is_custom: bool,
}

impl FeeScheduleRow {
    fn into_structure(self) -> AppResult<FeeStructure> {
        let revenue_share_percent = u8::try_from(self.revenue_share_percent).map_err(|_| {
            AppError::Internal(format!(
                "stored revenue share {} is out of range",
                self.revenue_share_percent
            ))
        })?;

        FeeStructure::restore(
            FeeFields {
                program_creation_fee: from_bigint(self.program_creation_fee, "program_creation_fee")?,
                subscription_fee: from_bigint(self.subscription_fee, "subscription_fee")?,
                certificate_fee: from_bigint(self.certificate_fee, "certificate_fee")?,
                revenue_share_percent,
            },
            self.is_custom,
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    total_revenue: i64,
    platform_share_accrued: i64,
    tenant_share_accrued: i64,
    last_withdrawal_time: Option<DateTime<Utc>>,
    version: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProgramRevenueRow {
    program_id: i64,
    amount: i64,
}
