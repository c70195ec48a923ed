//! Tracking Flow Integration Tests
//!
//! Tests the full tracking pipeline through the public API:
//! - Token endpoint: holder ranking, response body, detached registration
//! - Wallet endpoint: watch, swap detection, unwatch
//! - Swap events carrying the holder's rank
//!
//! Uses a scripted in-memory ledger; no network access.

use argus::config::WatchSettings;
use argus::handlers::{list_watched, track_token, track_wallet, untrack_wallet, TrackState};
use argus::ledger::{
    AccountChange, AccountChanges, LargestHolder, LedgerClient, LedgerError, TokenSupply,
};
use argus::watch::{SwapEvent, WatchRegistry};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tower::ServiceExt;

const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
const HOLDER_A: &str = "So11111111111111111111111111111111111111112";
const HOLDER_B: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

const SWAP_LOGS: [&str; 2] = [
    "Program log: Instruction: Swap",
    "Program log: swap 250000 in, 118 out",
];

/// Ledger double scripted per query. Subscriptions hand the test a sender
/// it can push account-change notifications through.
#[derive(Default)]
struct ScriptedLedger {
    supply: Mutex<Option<TokenSupply>>,
    holders: Mutex<Vec<LargestHolder>>,
    signatures: Mutex<Vec<String>>,
    logs: Mutex<HashMap<String, Vec<String>>>,
    senders: Mutex<HashMap<String, mpsc::Sender<AccountChange>>>,
}

impl ScriptedLedger {
    fn set_supply(&self, amount: u64, decimals: u8) {
        *self.supply.lock() = Some(TokenSupply { amount, decimals });
    }

    fn set_holders(&self, holders: &[(&str, &str)]) {
        *self.holders.lock() = holders
            .iter()
            .map(|(address, amount)| LargestHolder {
                address: address.to_string(),
                amount: amount.parse().expect("test amount must parse"),
                decimals: 6,
            })
            .collect();
    }

    /// Script the most recent transaction every monitor will resolve to
    fn set_latest(&self, signature: &str, logs: &[&str]) {
        *self.signatures.lock() = vec![signature.to_string()];
        self.logs
            .lock()
            .insert(signature.to_string(), logs.iter().map(|l| l.to_string()).collect());
    }

    /// Push one change notification to the monitor of `address`
    async fn notify(&self, address: &str) {
        let sender = self
            .senders
            .lock()
            .get(address)
            .cloned()
            .expect("no active subscription for address");
        sender
            .send(AccountChange { slot: 1, lamports: 0 })
            .await
            .expect("monitor dropped its change stream");
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn account_changes(&self, address: &Pubkey) -> Result<AccountChanges, LedgerError> {
        let (tx, changes) = AccountChanges::channel(8);
        self.senders.lock().insert(address.to_string(), tx);
        Ok(changes)
    }

    async fn recent_signatures(
        &self,
        _address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<String>, LedgerError> {
        let mut signatures = self.signatures.lock().clone();
        signatures.truncate(limit);
        Ok(signatures)
    }

    async fn transaction_logs(&self, signature: &str) -> Result<Option<Vec<String>>, LedgerError> {
        Ok(self.logs.lock().get(signature).cloned())
    }

    async fn token_supply(&self, _mint: &Pubkey) -> Result<TokenSupply, LedgerError> {
        self.supply
            .lock()
            .ok_or_else(|| LedgerError::Rpc("no supply scripted".to_string()))
    }

    async fn largest_holders(&self, _mint: &Pubkey) -> Result<Vec<LargestHolder>, LedgerError> {
        Ok(self.holders.lock().clone())
    }
}

/// Build the tracking router the way main does, over a scripted ledger
fn test_app(ledger: Arc<ScriptedLedger>) -> (Router, Arc<WatchRegistry>) {
    let registry = Arc::new(WatchRegistry::new(ledger.clone(), &WatchSettings::default()));
    let state = Arc::new(TrackState {
        ledger,
        registry: registry.clone(),
        registration_delay: Duration::from_millis(5),
    });

    let app = Router::new().nest(
        "/api",
        Router::new()
            .route("/track", get(list_watched))
            .route(
                "/track/wallet/{address}",
                get(track_wallet).delete(untrack_wallet),
            )
            .route("/track/token/{mint}", get(track_token))
            .with_state(state),
    );

    (app, registry)
}

async fn request(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn wait_for_watched(registry: &WatchRegistry, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while registry.watched_count().await < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "expected {} watched accounts, found {}",
            count,
            registry.watched_count().await
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn expect_event(rx: &mut broadcast::Receiver<SwapEvent>) -> SwapEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for swap event")
        .expect("event channel closed")
}

// =============================================================================
// TOKEN TRACKING FLOW
// =============================================================================

/// Ranked body is returned immediately, holders are watched in the
/// background, and a swap by a ranked holder surfaces with its rank
#[tokio::test]
async fn test_token_flow_ranks_watches_and_detects() {
    let ledger = Arc::new(ScriptedLedger::default());
    ledger.set_supply(1_000, 0);
    ledger.set_holders(&[(HOLDER_A, "400"), (HOLDER_B, "100")]);

    let (app, registry) = test_app(ledger.clone());
    let mut events = registry.events();

    let (status, body) = request(&app, Method::GET, &format!("/api/track/token/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "rank": 1,
                "percentage": "40.00%",
                "address": HOLDER_A,
                "quantity": "400.00"
            },
            {
                "rank": 2,
                "percentage": "10.00%",
                "address": HOLDER_B,
                "quantity": "100.00"
            }
        ])
    );

    // Registration is detached from the response
    wait_for_watched(&registry, 2).await;

    ledger.set_latest("sig-swap", &SWAP_LOGS);
    ledger.notify(HOLDER_A).await;

    let event = expect_event(&mut events).await;
    assert_eq!(event.address, HOLDER_A);
    assert_eq!(event.rank, Some(1));
    assert_eq!(event.signature, "sig-swap");
}

/// Ranking failure yields an empty array and watches nothing
#[tokio::test]
async fn test_token_flow_ranking_failure_is_empty_array() {
    let ledger = Arc::new(ScriptedLedger::default());
    let (app, registry) = test_app(ledger);

    let (status, body) = request(&app, Method::GET, &format!("/api/track/token/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(registry.watched_count().await, 0);
}

// =============================================================================
// WALLET TRACKING FLOW
// =============================================================================

/// Watch a wallet, detect a swap without rank context, then unwatch
#[tokio::test]
async fn test_wallet_flow_watch_detect_unwatch() {
    let ledger = Arc::new(ScriptedLedger::default());
    let (app, registry) = test_app(ledger.clone());
    let mut events = registry.events();

    let (status, body) = request(&app, Method::GET, &format!("/api/track/wallet/{WALLET}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "watching", "address": WALLET}));

    ledger.set_latest("sig-swap", &SWAP_LOGS);
    ledger.notify(WALLET).await;

    let event = expect_event(&mut events).await;
    assert_eq!(event.address, WALLET);
    assert_eq!(event.rank, None);

    let (status, body) =
        request(&app, Method::DELETE, &format!("/api/track/wallet/{WALLET}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "stopped", "address": WALLET}));
    assert_eq!(registry.watched_count().await, 0);

    // A second unwatch has nothing to stop
    let (status, _) = request(&app, Method::DELETE, &format!("/api/track/wallet/{WALLET}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Non-swap activity on a watched wallet emits nothing
#[tokio::test]
async fn test_wallet_flow_ignores_non_swap_activity() {
    let ledger = Arc::new(ScriptedLedger::default());
    let (app, registry) = test_app(ledger.clone());
    let mut events = registry.events();

    let (status, _) = request(&app, Method::GET, &format!("/api/track/wallet/{WALLET}")).await;
    assert_eq!(status, StatusCode::OK);

    ledger.set_latest("sig-transfer", &["Program log: Instruction: Transfer"]);
    ledger.notify(WALLET).await;

    let result = timeout(Duration::from_millis(100), events.recv()).await;
    assert!(result.is_err(), "unexpected swap event: {:?}", result);
    assert_eq!(registry.watched_count().await, 1);
}
