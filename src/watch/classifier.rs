//! Swap classification over transaction log text
//!
//! A transaction counts as swap-like when its joined log messages contain
//! one of the marker substrings. The match is case-sensitive and makes no
//! attempt to decode the instructions behind the logs.

/// Substrings that mark a transaction as swap-like
const SWAP_MARKERS: [&str; 2] = ["swap", "trade"];

/// Classify a transaction's ordered log messages
pub fn is_swap_like(logs: &[String]) -> bool {
    let joined = logs.join("\n");
    SWAP_MARKERS.iter().any(|marker| joined.contains(marker))
}
