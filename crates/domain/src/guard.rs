//! Kill switch and operation throttling shared by tenant-scoped instances.

use campusly_core::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of a tenant instance. `Recovered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Accepts state-changing calls.
    #[default]
    Active,
    /// Permanently blocks state-changing calls.
    Recovered,
}

impl InstanceStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Recovered => "recovered",
        }
    }

    /// Parses a storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "recovered" => Ok(Self::Recovered),
            _ => Err(AppError::Validation(format!(
                "unknown instance status '{value}'"
            ))),
        }
    }

    /// Fails once the instance has been recovered.
    pub fn ensure_operational(&self) -> AppResult<()> {
        match self {
            Self::Active => Ok(()),
            Self::Recovered => Err(AppError::Conflict(
                "instance has been recovered and no longer accepts changes".to_owned(),
            )),
        }
    }

    /// The single one-way transition.
    pub fn recover(&self) -> AppResult<Self> {
        match self {
            Self::Active => Ok(Self::Recovered),
            Self::Recovered => Err(AppError::Conflict("instance already recovered".to_owned())),
        }
    }
}

/// Limits applied to one rate-limited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Minimum time between two events of the same caller.
    pub cooldown: Duration,
    /// Maximum events per window.
    pub burst_limit: u32,
    /// Window length. Counters reset exactly at the window boundary.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Creates a validated policy.
    pub fn new(cooldown: Duration, burst_limit: u32, window: Duration) -> AppResult<Self> {
        if cooldown < Duration::zero() {
            return Err(AppError::Validation(
                "rate limit cooldown must not be negative".to_owned(),
            ));
        }

        if burst_limit == 0 {
            return Err(AppError::Validation(
                "rate limit burst must be greater than zero".to_owned(),
            ));
        }

        if window <= Duration::zero() {
            return Err(AppError::Validation(
                "rate limit window must be positive".to_owned(),
            ));
        }

        Ok(Self {
            cooldown,
            burst_limit,
            window,
        })
    }
}

/// Per-caller throttling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitWindow {
    /// Time of the last admitted event.
    pub last_event_at: Option<DateTime<Utc>>,
    /// Start of the current counting window.
    pub window_started_at: Option<DateTime<Utc>>,
    /// Events admitted in the current window.
    pub count: u32,
}

impl RateLimitWindow {
    /// Admits one event at `now` or fails with `RateLimited`.
    ///
    /// On failure the window is left unchanged.
    pub fn admit(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(last_event_at) = self.last_event_at
            && now < last_event_at + policy.cooldown
        {
            return Err(AppError::RateLimited(format!(
                "operation cooldown active until {}",
                last_event_at + policy.cooldown
            )));
        }

        let (window_started_at, count) = match self.window_started_at {
            Some(started_at) if now < started_at + policy.window => (started_at, self.count),
            _ => (now, 0),
        };

        if count >= policy.burst_limit {
            return Err(AppError::RateLimited(format!(
                "burst limit of {} reached for window starting {window_started_at}",
                policy.burst_limit
            )));
        }

        self.last_event_at = Some(now);
        self.window_started_at = Some(window_started_at);
        self.count = count + 1;
        Ok(())
    }
}
