//! Top-holder ranking for a token mint
//!
//! Pure function of the mint and the ledger state at call time: fetch the
//! supply, fetch the largest holder accounts, attach rank and percentage
//! share. The ledger's descending order is authoritative and preserved.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::ledger::LedgerClient;

/// Errors from the ranking computation
#[derive(Debug, Error)]
pub enum RankError {
    /// The mint is invalid, the supply query failed, or supply is zero
    #[error("token supply unavailable: {0}")]
    SupplyUnavailable(String),

    /// The largest-accounts query failed
    #[error("largest-holder query failed: {0}")]
    HolderQueryFailed(String),
}

/// One ranked row of the top-holder computation
#[derive(Debug, Clone, Serialize)]
pub struct HolderEntry {
    /// 1-based position, 1 = largest
    pub rank: u32,
    /// Share of circulating supply, rendered as "NN.NN%"
    #[serde(serialize_with = "as_percentage")]
    pub percentage: Decimal,
    /// Token account address
    pub address: String,
    /// Balance in whole-token units, rendered to two decimals
    #[serde(serialize_with = "as_quantity")]
    pub quantity: Decimal,
}

fn as_percentage<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}%"))
}

fn as_quantity<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

/// Rank the largest holders of `mint` by share of circulating supply
pub async fn rank_holders(
    ledger: &dyn LedgerClient,
    mint: &Pubkey,
) -> Result<Vec<HolderEntry>, RankError> {
    let supply = ledger
        .token_supply(mint)
        .await
        .map_err(|e| RankError::SupplyUnavailable(e.to_string()))?;

    let circulating = supply.circulating();
    if circulating.is_zero() {
        return Err(RankError::SupplyUnavailable(
            "circulating supply is zero".to_string(),
        ));
    }

    let holders = ledger
        .largest_holders(mint)
        .await
        .map_err(|e| RankError::HolderQueryFailed(e.to_string()))?;

    let entries = holders
        .into_iter()
        .enumerate()
        .map(|(index, holder)| HolderEntry {
            rank: index as u32 + 1,
            percentage: round2(holder.amount / circulating * Decimal::ONE_HUNDRED),
            address: holder.address,
            quantity: round2(holder.amount),
        })
        .collect();

    Ok(entries)
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
