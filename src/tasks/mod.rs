//! Recurring background jobs. Call [`spawn_all`] once during startup.

use crate::services::{ClaimService, DealService};
use std::time::Duration;

const CLAIM_EXPIRY_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEAL_EXPIRY_INTERVAL: Duration = Duration::from_secs(3600);

/// Detaches every task via `tokio::spawn`. Failures are logged and the loop continues.
pub fn spawn_all(claim_service: ClaimService, deal_service: DealService) {
    // pending claims past expires_at
    tokio::spawn(async move {
        loop {
            match claim_service.expire_stale_claims().await {
                Ok(n) if n > 0 => log::info!("Expired stale claims: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to expire stale claims: {e:?}"),
            }
            tokio::time::sleep(CLAIM_EXPIRY_INTERVAL).await;
        }
    });

    // deals past valid_until
    tokio::spawn(async move {
        loop {
            match deal_service.deactivate_expired_deals().await {
                Ok(n) if n > 0 => log::info!("Deactivated expired deals: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to deactivate expired deals: {e:?}"),
            }
            tokio::time::sleep(DEAL_EXPIRY_INTERVAL).await;
        }
    });
}
