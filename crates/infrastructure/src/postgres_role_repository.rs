use std::str::FromStr;

use async_trait::async_trait;
use campusly_application::RoleRepository;
use campusly_core::{AccountId, AppResult};
use campusly_domain::{Role, RoleGrant, RoleScope};
use sqlx::PgPool;
use uuid::Uuid;

use crate::postgres_values::{internal, scope_from_key, scope_key};

/// PostgreSQL-backed role grant store.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_grants (role, account_id, scope_tenant_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role, account_id, scope_tenant_id) DO NOTHING
            "#,
        )
        .bind(grant.role.as_str())
        .bind(grant.account.as_uuid())
        .bind(scope_key(grant.scope.tenant_id()))
        .execute(&self.pool)
        .await
        .map_err(internal("insert role grant"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_grants
            WHERE role = $1 AND account_id = $2 AND scope_tenant_id = $3
            "#,
        )
        .bind(grant.role.as_str())
        .bind(grant.account.as_uuid())
        .bind(scope_key(grant.scope.tenant_id()))
        .execute(&self.pool)
        .await
        .map_err(internal("delete role grant"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn contains_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_grants
                WHERE role = $1 AND account_id = $2 AND scope_tenant_id = $3
            )
            "#,
        )
        .bind(grant.role.as_str())
        .bind(grant.account.as_uuid())
        .bind(scope_key(grant.scope.tenant_id()))
        .fetch_one(&self.pool)
        .await
        .map_err(internal("look up role grant"))
    }

    async fn any_holder(&self, role: Role, scope: RoleScope) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_grants
                WHERE role = $1 AND scope_tenant_id = $2
            )
            "#,
        )
        .bind(role.as_str())
        .bind(scope_key(scope.tenant_id()))
        .fetch_one(&self.pool)
        .await
        .map_err(internal("look up role holders"))
    }

    async fn list_grants_for_account(&self, account: AccountId) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT role, scope_tenant_id
            FROM role_grants
            WHERE account_id = $1
            ORDER BY scope_tenant_id, role
            "#,
        )
        .bind(account.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list role grants"))?;

        rows.into_iter()
            .map(|row| {
                Ok(RoleGrant {
                    role: Role::from_str(row.role.as_str())?,
                    account,
                    scope: RoleScope::from_option(scope_from_key(row.scope_tenant_id)),
                })
            })
            .collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleGrantRow {
    role: String,
    scope_tenant_id: Uuid,
}
