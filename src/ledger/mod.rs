//! Ledger client boundary
//!
//! Everything the core needs from a Solana node, behind one trait so the
//! watching and ranking logic can run against an in-memory fake in tests.
//! The production implementation lives in [`rpc`].

pub mod rpc;


pub use rpc::RpcLedger;

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by a ledger client
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Websocket endpoint could not be reached
    #[error("websocket connection failed: {0}")]
    Connect(String),

    /// RPC request failed (network, timeout, or node-side error)
    #[error("rpc request failed: {0}")]
    Rpc(String),
}

/// One account-change notification
#[derive(Debug, Clone, Copy)]
pub struct AccountChange {
    /// Slot the change was observed at
    pub slot: u64,
    /// Account balance after the change
    pub lamports: u64,
}

/// Token supply as reported by the ledger
#[derive(Debug, Clone, Copy)]
pub struct TokenSupply {
    /// Raw supply in base units
    pub amount: u64,
    /// Decimal places of the mint
    pub decimals: u8,
}

impl TokenSupply {
    /// Circulating supply in whole-token units
    pub fn circulating(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.amount as i128, self.decimals as u32)
    }
}

/// One entry of the largest-holder list, in whole-token units
#[derive(Debug, Clone)]
pub struct LargestHolder {
    /// Token account address holding the balance
    pub address: String,
    /// Balance in whole-token units
    pub amount: Decimal,
    /// Decimal places of the mint
    pub decimals: u8,
}

/// Live stream of account-change notifications.
///
/// Dropping the stream cancels the backing subscription task, which
/// unsubscribes from the node. Nothing is leaked past the stream's lifetime.
pub struct AccountChanges {
    rx: mpsc::Receiver<AccountChange>,
    shutdown: CancellationToken,
}

impl AccountChanges {
    /// Create a stream and the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<AccountChange>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        let changes = Self {
            rx,
            shutdown: CancellationToken::new(),
        };
        (tx, changes)
    }

    /// Token cancelled when the stream is dropped
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Next notification; `None` once the subscription has ended
    pub async fn next(&mut self) -> Option<AccountChange> {
        self.rx.recv().await
    }
}

impl Drop for AccountChanges {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Read-only view of the ledger shared by all components
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Subscribe to change notifications for one account
    async fn account_changes(&self, address: &Pubkey) -> Result<AccountChanges, LedgerError>;

    /// Most recent transaction signatures for an account, newest first
    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<String>, LedgerError>;

    /// Ordered log messages of a confirmed transaction, if the node has them
    async fn transaction_logs(&self, signature: &str) -> Result<Option<Vec<String>>, LedgerError>;

    /// Supply of a token mint
    async fn token_supply(&self, mint: &Pubkey) -> Result<TokenSupply, LedgerError>;

    /// Largest holder accounts of a mint, ordered descending by balance
    async fn largest_holders(&self, mint: &Pubkey) -> Result<Vec<LargestHolder>, LedgerError>;
}
