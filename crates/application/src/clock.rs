use chrono::{DateTime, Utc};

/// Source of the current time. Every expiry, grace and cooldown decision
/// compares against this value.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
