use async_trait::async_trait;
use campusly_application::PlatformTreasury;
use campusly_core::{AppError, AppResult};
use sqlx::PgPool;

use crate::postgres_values::{from_bigint, internal, to_bigint};

/// PostgreSQL-backed platform treasury stored as a single row.
#[derive(Clone)]
pub struct PostgresTreasury {
    pool: PgPool,
}

impl PostgresTreasury {
    /// Creates a treasury with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlatformTreasury for PostgresTreasury {
    async fn credit(&self, amount: u64) -> AppResult<u64> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO platform_treasury (singleton, balance)
            VALUES (TRUE, $1)
            ON CONFLICT (singleton) DO UPDATE
            SET balance = platform_treasury.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(to_bigint(amount, "credit")?)
        .fetch_one(&self.pool)
        .await
        .map_err(internal("credit platform treasury"))?;

        from_bigint(balance, "platform balance")
    }

    async fn debit(&self, amount: u64) -> AppResult<u64> {
        let amount = to_bigint(amount, "debit")?;
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE platform_treasury
            SET balance = balance - $1
            WHERE singleton AND balance >= $1
            RETURNING balance
            "#,
        )
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("debit platform treasury"))?
        .ok_or_else(|| {
            AppError::Validation(format!("insufficient platform funds for debit of {amount}"))
        })?;

        from_bigint(balance, "platform balance")
    }

    async fn balance(&self) -> AppResult<u64> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT balance
            FROM platform_treasury
            WHERE singleton
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("read platform balance"))?;

        balance.map_or(Ok(0), |balance| from_bigint(balance, "platform balance"))
    }
}
