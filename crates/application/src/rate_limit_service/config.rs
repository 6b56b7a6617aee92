use campusly_domain::RateLimitPolicy;

/// A throttled operation and the policy applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Operation category (e.g. "tuition", "certificate").
    pub category: String,
    /// Cooldown, burst limit and window applied per caller.
    pub policy: RateLimitPolicy,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, policy: RateLimitPolicy) -> Self {
        Self {
            category: category.into(),
            policy,
        }
    }
}
