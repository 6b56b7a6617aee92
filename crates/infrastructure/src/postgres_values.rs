//! Conversions between domain values and PostgreSQL column types.

use campusly_core::{AppError, AppResult, TenantId};
use uuid::Uuid;

/// Converts an unsigned amount into a `BIGINT` value.
pub(crate) fn to_bigint(value: u64, column: &str) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::Validation(format!("{column} value {value} exceeds storage range")))
}

/// Converts a stored `BIGINT` back into an unsigned amount.
pub(crate) fn from_bigint(value: i64, column: &str) -> AppResult<u64> {
    u64::try_from(value)
        .map_err(|_| AppError::Internal(format!("stored {column} is negative: {value}")))
}

/// Maps an optional tenant to the scope key. The nil UUID stands for the
/// platform-wide scope.
pub(crate) fn scope_key(tenant_id: Option<TenantId>) -> Uuid {
    tenant_id.map_or_else(Uuid::nil, |tenant_id| tenant_id.as_uuid())
}

/// Inverse of [`scope_key`].
pub(crate) fn scope_from_key(key: Uuid) -> Option<TenantId> {
    (!key.is_nil()).then(|| TenantId::from_uuid(key))
}

pub(crate) fn internal(action: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |error| AppError::Internal(format!("failed to {action}: {error}"))
}
