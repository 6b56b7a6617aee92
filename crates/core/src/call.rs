use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Identity of the caller plus the value attached to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    caller: AccountId,
    attached_value: u64,
}

impl CallContext {
    /// Creates a context for a call that carries a payment.
    #[must_use]
    pub fn new(caller: AccountId, attached_value: u64) -> Self {
        Self {
            caller,
            attached_value,
        }
    }

    /// Creates a context for a call without attached value.
    #[must_use]
    pub fn unpaid(caller: AccountId) -> Self {
        Self::new(caller, 0)
    }

    /// Returns the calling account.
    #[must_use]
    pub fn caller(&self) -> AccountId {
        self.caller
    }

    /// Returns the value attached to the call.
    #[must_use]
    pub fn attached_value(&self) -> u64 {
        self.attached_value
    }

    /// Returns a context acting as `caller` that forwards the attached value.
    #[must_use]
    pub fn forwarded_as(&self, caller: AccountId) -> Self {
        Self::new(caller, self.attached_value)
    }
}
