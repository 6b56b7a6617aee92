use std::collections::HashSet;

use async_trait::async_trait;
use campusly_application::RoleRepository;
use campusly_core::{AccountId, AppResult};
use campusly_domain::{Role, RoleGrant, RoleScope};
use tokio::sync::RwLock;

/// In-memory role grant store.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    grants: RwLock<HashSet<RoleGrant>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn insert_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.write().await.insert(grant))
    }

    async fn delete_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.write().await.remove(&grant))
    }

    async fn contains_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.read().await.contains(&grant))
    }

    async fn any_holder(&self, role: Role, scope: RoleScope) -> AppResult<bool> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .any(|grant| grant.role == role && grant.scope == scope))
    }

    async fn list_grants_for_account(&self, account: AccountId) -> AppResult<Vec<RoleGrant>> {
        let mut grants: Vec<RoleGrant> = self
            .grants
            .read()
            .await
            .iter()
            .filter(|grant| grant.account == account)
            .copied()
            .collect();
        grants.sort_by_key(|grant| (grant.scope, grant.role));

        Ok(grants)
    }
}
