use async_trait::async_trait;
use campusly_application::PlatformTreasury;
use campusly_core::{AppError, AppResult};
use tokio::sync::Mutex;

/// In-memory platform treasury.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    balance: Mutex<u64>,
}

impl InMemoryTreasury {
    /// Creates an empty treasury.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformTreasury for InMemoryTreasury {
    async fn credit(&self, amount: u64) -> AppResult<u64> {
        let mut balance = self.balance.lock().await;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| AppError::Validation("platform balance overflows".to_owned()))?;
        Ok(*balance)
    }

    async fn debit(&self, amount: u64) -> AppResult<u64> {
        let mut balance = self.balance.lock().await;
        *balance = balance.checked_sub(amount).ok_or_else(|| {
            AppError::Validation(format!(
                "insufficient platform funds: requested {amount}, available {}",
                *balance
            ))
        })?;
        Ok(*balance)
    }

    async fn balance(&self) -> AppResult<u64> {
        Ok(*self.balance.lock().await)
    }
}
