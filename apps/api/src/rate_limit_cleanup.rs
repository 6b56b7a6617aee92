use chrono::Duration;
use tracing::{error, info};

use crate::state::AppState;

/// Periodically drops throttle windows idle for longer than `retention`.
pub fn spawn_rate_limit_cleanup_worker(state: AppState, retention: Duration) {
    let Ok(period) = retention.to_std() else {
        info!("rate limit cleanup worker disabled (non-positive retention)");
        return;
    };
    if period.is_zero() {
        info!("rate limit cleanup worker disabled (zero retention)");
        return;
    }

    tokio::spawn(async move {
        info!(retention_secs = period.as_secs(), "rate limit cleanup worker started");

        loop {
            tokio::time::sleep(period).await;

            match state.rate_limit_service.cleanup(retention).await {
                Ok(removed) => info!(removed, "expired rate limit windows removed"),
                Err(error) => error!(error = %error, "rate limit cleanup failed"),
            }
        }
    });
}
