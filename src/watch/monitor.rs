//! Watch registry and per-account swap monitors
//!
//! One monitor task per watched account. Each account-change notification
//! triggers a resolution: fetch the account's most recent signature, fetch
//! that transaction's log messages, classify. Resolutions for the same
//! account may complete out of order, so each carries a sequence number and
//! only the newest completed one counts.
//!
//! The registry owns every monitor. A second watch request for an address
//! already present is rejected, and `unwatch` cancels the monitor, which
//! drops its change stream and releases the node-side subscription.

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::WatchSettings;
use crate::ledger::{AccountChanges, LedgerClient, LedgerError};
use crate::watch::classifier;

/// Emitted when a watched account's latest transaction looks like a swap
#[derive(Debug, Clone, Serialize)]
pub struct SwapEvent {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub signature: String,
}

/// Snapshot row describing one active monitor
#[derive(Debug, Clone, Serialize)]
pub struct WatchedAccount {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub started_at: DateTime<Utc>,
}

/// Errors from watch registration
#[derive(Debug, Error)]
pub enum WatchError {
    /// The address already has an active monitor
    #[error("already watching account {0}")]
    AlreadyWatched(String),

    /// The account-change subscription could not be established
    #[error("account subscription failed: {0}")]
    Subscription(#[from] LedgerError),
}

struct WatchHandle {
    rank: Option<u32>,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    generation: u64,
}

type ActiveWatches = Arc<RwLock<HashMap<String, WatchHandle>>>;

/// Registry of active per-account swap monitors
pub struct WatchRegistry {
    ledger: Arc<dyn LedgerClient>,
    active: ActiveWatches,
    events: broadcast::Sender<SwapEvent>,
    seen_capacity: NonZeroUsize,
    generations: AtomicU64,
}

impl WatchRegistry {
    pub fn new(ledger: Arc<dyn LedgerClient>, settings: &WatchSettings) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        let seen_capacity = NonZeroUsize::new(settings.seen_signature_capacity.max(1))
            .expect("Cache capacity must be > 0");

        Self {
            ledger,
            active: Arc::new(RwLock::new(HashMap::new())),
            events,
            seen_capacity,
            generations: AtomicU64::new(0),
        }
    }

    /// Start monitoring an account for swap activity
    pub async fn watch(&self, address: &Pubkey, rank: Option<u32>) -> Result<(), WatchError> {
        let key = address.to_string();

        if self.active.read().await.contains_key(&key) {
            return Err(WatchError::AlreadyWatched(key));
        }

        let changes = self.ledger.account_changes(address).await?;

        let mut active = self.active.write().await;
        if active.contains_key(&key) {
            // Lost a race with a concurrent watch for the same address.
            // Dropping the fresh stream releases its subscription.
            return Err(WatchError::AlreadyWatched(key));
        }

        let cancel = CancellationToken::new();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        active.insert(
            key.clone(),
            WatchHandle {
                rank,
                started_at: Utc::now(),
                cancel: cancel.clone(),
                generation,
            },
        );
        drop(active);

        match rank {
            Some(rank) => tracing::info!(address = %key, rank, "Watching account"),
            None => tracing::info!(address = %key, "Watching account"),
        }

        tokio::spawn(run_monitor(
            self.ledger.clone(),
            self.active.clone(),
            self.events.clone(),
            changes,
            *address,
            rank,
            cancel,
            generation,
            self.seen_capacity,
        ));

        Ok(())
    }

    /// Stop monitoring an account; returns false if it was not watched
    pub async fn unwatch(&self, address: &Pubkey) -> bool {
        let key = address.to_string();
        match self.active.write().await.remove(&key) {
            Some(handle) => {
                handle.cancel.cancel();
                tracing::info!(address = %key, "Stopped watching account");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the active monitors
    pub async fn watched(&self) -> Vec<WatchedAccount> {
        self.active
            .read()
            .await
            .iter()
            .map(|(address, handle)| WatchedAccount {
                address: address.clone(),
                rank: handle.rank,
                started_at: handle.started_at,
            })
            .collect()
    }

    pub async fn watched_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Subscribe to swap events from all monitors
    pub fn events(&self) -> broadcast::Receiver<SwapEvent> {
        self.events.subscribe()
    }
}

/// Per-account resolution bookkeeping shared by in-flight notifications
struct ResolutionState {
    completed: AtomicU64,
    emitted: Mutex<LruCache<String, ()>>,
}

impl ResolutionState {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            completed: AtomicU64::new(0),
            emitted: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// True when `sequence` is newer than every previously completed one
    fn complete(&self, sequence: u64) -> bool {
        self.completed.fetch_max(sequence, Ordering::AcqRel) < sequence
    }

    /// True on the first sighting of `signature`
    fn first_emission(&self, signature: &str) -> bool {
        self.emitted.lock().put(signature.to_string(), ()).is_none()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_monitor(
    ledger: Arc<dyn LedgerClient>,
    active: ActiveWatches,
    events: broadcast::Sender<SwapEvent>,
    mut changes: AccountChanges,
    address: Pubkey,
    rank: Option<u32>,
    cancel: CancellationToken,
    generation: u64,
    seen_capacity: NonZeroUsize,
) {
    let key = address.to_string();
    let state = Arc::new(ResolutionState::new(seen_capacity));
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(address = %key, "Monitor stopped");
                break;
            }
            change = changes.next() => {
                let Some(change) = change else {
                    tracing::warn!(address = %key, "Account change stream ended");
                    break;
                };
                sequence += 1;
                tracing::debug!(
                    address = %key,
                    slot = change.slot,
                    lamports = change.lamports,
                    sequence,
                    "Account change received"
                );
                tokio::spawn(handle_notification(
                    ledger.clone(),
                    events.clone(),
                    state.clone(),
                    address,
                    rank,
                    sequence,
                    change.slot,
                ));
            }
        }
    }

    drop(changes);

    // Only remove the registry entry if it is still ours; the address may
    // have been unwatched and re-watched while this task was winding down.
    let mut active = active.write().await;
    let owned = active
        .get(&key)
        .map_or(false, |handle| handle.generation == generation);
    if owned {
        active.remove(&key);
    }
}

/// Resolve and classify one account-change notification.
///
/// Every failure here is absorbed: the monitor must keep processing future
/// notifications no matter what a single resolution did.
async fn handle_notification(
    ledger: Arc<dyn LedgerClient>,
    events: broadcast::Sender<SwapEvent>,
    state: Arc<ResolutionState>,
    address: Pubkey,
    rank: Option<u32>,
    sequence: u64,
    slot: u64,
) {
    let key = address.to_string();

    match resolve_latest(ledger.as_ref(), &address).await {
        Ok(Some((signature, logs))) => {
            if !state.complete(sequence) {
                tracing::debug!(address = %key, sequence, "Discarding stale resolution");
                return;
            }
            if !classifier::is_swap_like(&logs) {
                return;
            }
            if !state.first_emission(&signature) {
                tracing::debug!(address = %key, signature = %signature, "Swap already reported");
                return;
            }

            match rank {
                Some(rank) => {
                    tracing::info!(address = %key, rank, signature = %signature, "Swap detected")
                }
                None => tracing::info!(address = %key, signature = %signature, "Swap detected"),
            }

            let _ = events.send(SwapEvent {
                address: key,
                rank,
                signature,
            });
        }
        Ok(None) => {
            // Node lag: the notification carried no resolvable transaction.
            state.complete(sequence);
            tracing::debug!(address = %key, slot, "No resolvable transaction yet");
        }
        Err(e) => {
            tracing::warn!(address = %key, error = %e, "Transaction resolution failed");
        }
    }
}

async fn resolve_latest(
    ledger: &dyn LedgerClient,
    address: &Pubkey,
) -> Result<Option<(String, Vec<String>)>, LedgerError> {
    let signatures = ledger.recent_signatures(address, 1).await?;
    let Some(signature) = signatures.into_iter().next() else {
        return Ok(None);
    };

    let Some(logs) = ledger.transaction_logs(&signature).await? else {
        return Ok(None);
    };

    Ok(Some((signature, logs)))
}
