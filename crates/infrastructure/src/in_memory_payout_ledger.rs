use async_trait::async_trait;
use campusly_application::FundsTransfer;
use campusly_core::{AccountId, AppError, AppResult};
use tokio::sync::RwLock;
use tracing::info;

/// One outbound transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    /// Receiving account.
    pub recipient: AccountId,
    /// Transferred amount.
    pub amount: u64,
}

/// Funds transfer adapter that books payouts in memory.
#[derive(Debug, Default)]
pub struct InMemoryPayoutLedger {
    payouts: RwLock<Vec<Payout>>,
}

impl InMemoryPayoutLedger {
    /// Creates an empty payout ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every payout made to `recipient`.
    pub async fn payouts_to(&self, recipient: AccountId) -> Vec<Payout> {
        self.payouts
            .read()
            .await
            .iter()
            .filter(|payout| payout.recipient == recipient)
            .copied()
            .collect()
    }
}

#[async_trait]
impl FundsTransfer for InMemoryPayoutLedger {
    async fn transfer(&self, recipient: AccountId, amount: u64) -> AppResult<()> {
        if recipient.is_nil() {
            return Err(AppError::Validation(
                "cannot transfer to the null account".to_owned(),
            ));
        }

        self.payouts.write().await.push(Payout { recipient, amount });
        info!(recipient = %recipient, amount, "payout booked");
        Ok(())
    }
}
