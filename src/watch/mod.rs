//! Account watching
//!
//! Turns account-change notifications into classified swap events: the
//! registry of live monitors, the log-text classifier, and the throttled
//! scheduler that feeds ranked holder lists into the registry.

pub mod classifier;
pub mod monitor;
pub mod scheduler;

pub use monitor::{SwapEvent, WatchError, WatchRegistry, WatchedAccount};
pub use scheduler::watch_holders;
