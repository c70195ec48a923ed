//! Throttled registration of ranked holders
//!
//! Registrations are deliberately sequential with a fixed delay between
//! them so a large holder list never bursts subscriptions at the node.
//! One bad entry is skipped, never fatal for the rest of the list.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

use crate::holders::HolderEntry;
use crate::watch::WatchRegistry;

/// Register a monitor for every holder, rank 1 first
pub async fn watch_holders(
    registry: Arc<WatchRegistry>,
    holders: Vec<HolderEntry>,
    delay: Duration,
) {
    let total = holders.len();

    for entry in holders {
        match entry.address.parse::<Pubkey>() {
            Ok(address) => {
                if let Err(e) = registry.watch(&address, Some(entry.rank)).await {
                    tracing::warn!(
                        address = %entry.address,
                        rank = entry.rank,
                        error = %e,
                        "Skipping holder registration"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    address = %entry.address,
                    rank = entry.rank,
                    error = %e,
                    "Skipping holder with malformed address"
                );
            }
        }

        tokio::time::sleep(delay).await;
    }

    tracing::info!(holders = total, "Holder registration pass complete");
}
