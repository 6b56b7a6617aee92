use async_trait::async_trait;
use campusly_core::{AccountId, AppResult};

/// Accumulated platform funds.
#[async_trait]
pub trait PlatformTreasury: Send + Sync {
    /// Adds funds and returns the new balance.
    async fn credit(&self, amount: u64) -> AppResult<u64>;

    /// Removes funds atomically and returns the new balance. Fails with
    /// `Validation` when `amount` exceeds the balance, leaving it unchanged.
    async fn debit(&self, amount: u64) -> AppResult<u64>;

    /// Returns the current balance.
    async fn balance(&self) -> AppResult<u64>;
}

/// Outbound value transfer to an external account.
///
/// Implementations may call back into the services; callers finalize their
/// own bookkeeping before invoking it.
#[async_trait]
pub trait FundsTransfer: Send + Sync {
    /// Sends `amount` to `recipient`.
    async fn transfer(&self, recipient: AccountId, amount: u64) -> AppResult<()>;
}
