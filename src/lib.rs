//! Argus Library
//!
//! Watches Solana accounts for swap/trade activity and ranks the largest
//! holders of a token mint so they can be watched automatically.
//! This library exposes core modules for testing.

pub mod config;
pub mod error;
pub mod handlers;
pub mod holders;
pub mod ledger;
pub mod watch;

// Re-export commonly used types for tests
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use holders::{rank_holders, HolderEntry, RankError};
pub use ledger::{LedgerClient, LedgerError, RpcLedger};
pub use watch::{watch_holders, SwapEvent, WatchError, WatchRegistry, WatchedAccount};
