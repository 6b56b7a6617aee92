use campusly_core::{AccountId, AppResult, TenantId};

pub mod fees;
pub mod health;
pub mod instances;
pub mod revenue;
pub mod roles;
pub mod tenants;

#[cfg(test)]
mod tests;

fn tenant_path(value: &str) -> AppResult<TenantId> {
    TenantId::parse(value)
}

fn account_path(value: &str) -> AppResult<AccountId> {
    AccountId::parse(value)
}
