//! Solana RPC implementation of the ledger boundary
//!
//! HTTP queries go through the nonblocking `RpcClient`; account-change
//! subscriptions open a `PubsubClient` per watched account and forward
//! notifications through a channel until the consumer drops the stream.

use async_trait::async_trait;
use futures_util::StreamExt;
use rust_decimal::Decimal;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcTransactionConfig};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::time::Duration;

use crate::config::RpcConfig;
use crate::ledger::{
    AccountChange, AccountChanges, LargestHolder, LedgerClient, LedgerError, TokenSupply,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Ledger client backed by a Solana RPC node
pub struct RpcLedger {
    http: RpcClient,
    ws_url: String,
}

impl RpcLedger {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            http: RpcClient::new_with_timeout(
                config.http_url.clone(),
                Duration::from_millis(config.timeout_ms),
            ),
            ws_url: config.ws_url.clone(),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn account_changes(&self, address: &Pubkey) -> Result<AccountChanges, LedgerError> {
        // Connect up front so a bad endpoint surfaces to the caller; the
        // subscription itself has to live inside the forwarding task because
        // the notification stream borrows the pubsub client.
        let client = PubsubClient::new(&self.ws_url)
            .await
            .map_err(|e| LedgerError::Connect(e.to_string()))?;

        let (tx, changes) = AccountChanges::channel(CHANGE_CHANNEL_CAPACITY);
        let shutdown = changes.shutdown_token();
        let address = *address;

        tokio::spawn(async move {
            let config = RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                commitment: Some(CommitmentConfig::confirmed()),
                min_context_slot: None,
            };

            let (mut stream, unsubscribe) =
                match client.account_subscribe(&address, Some(config)).await {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        tracing::warn!(
                            address = %address,
                            error = %e,
                            "Account subscription failed"
                        );
                        return;
                    }
                };

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    update = stream.next() => {
                        let Some(update) = update else { break };
                        let change = AccountChange {
                            slot: update.context.slot,
                            lamports: update.value.lamports,
                        };
                        if tx.send(change).await.is_err() {
                            break;
                        }
                    }
                }
            }

            drop(stream);
            unsubscribe().await;
        });

        Ok(changes)
    }

    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<String>, LedgerError> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before: None,
            until: None,
            limit: Some(limit),
            commitment: Some(CommitmentConfig::confirmed()),
        };

        let signatures = self
            .http
            .get_signatures_for_address_with_config(address, config)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        Ok(signatures.into_iter().map(|info| info.signature).collect())
    }

    async fn transaction_logs(&self, signature: &str) -> Result<Option<Vec<String>>, LedgerError> {
        let signature: Signature = signature
            .parse()
            .map_err(|e| LedgerError::Rpc(format!("invalid signature: {e}")))?;

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        let transaction = self
            .http
            .get_transaction_with_config(&signature, config)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        let logs = transaction
            .transaction
            .meta
            .and_then(|meta| Option::<Vec<String>>::from(meta.log_messages));

        Ok(logs)
    }

    async fn token_supply(&self, mint: &Pubkey) -> Result<TokenSupply, LedgerError> {
        let supply = self
            .http
            .get_token_supply(mint)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        let amount = supply
            .amount
            .parse::<u64>()
            .map_err(|e| LedgerError::Rpc(format!("unparseable supply amount: {e}")))?;

        Ok(TokenSupply {
            amount,
            decimals: supply.decimals,
        })
    }

    async fn largest_holders(&self, mint: &Pubkey) -> Result<Vec<LargestHolder>, LedgerError> {
        let accounts = self
            .http
            .get_token_largest_accounts(mint)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        accounts
            .into_iter()
            .map(|account| {
                let amount = account
                    .amount
                    .ui_amount_string
                    .parse::<Decimal>()
                    .map_err(|e| LedgerError::Rpc(format!("unparseable holder amount: {e}")))?;

                Ok(LargestHolder {
                    address: account.address,
                    amount,
                    decimals: account.amount.decimals,
                })
            })
            .collect()
    }
}
