//! Per-caller operation throttling.
//!
//! One component covers every limited call site: a cooldown between two
//! events plus a burst limit per window, keyed by `"{category}:{caller}"`.

mod config;
mod ports;
mod service;

pub use config::RateLimitRule;
pub use ports::RateLimitRepository;
pub use service::RateLimitService;
