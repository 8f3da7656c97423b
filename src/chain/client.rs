use std::num::NonZeroUsize;
use std::str::FromStr;

use async_trait::async_trait;
use log::{debug, info, warn};
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig},
};
use solana_rpc_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction as SolanaTransaction,
};
use solana_transaction_status::UiTransactionEncoding;

#[cfg(test)]
use mockall::automock;

use super::{
    cache::TransactionCache,
    error::ChainError,
    parser::parse_confirmed_transaction,
    types::Transaction,
};
use crate::SolanaConfig;

/// Network access used by the monitor, the wallet and the executor.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Recent transactions touching `address`, oldest first.
    async fn transactions_for_address(&self, address: &str) -> Result<Vec<Transaction>, ChainError>;

    async fn latest_blockhash(&self) -> Result<Hash, ChainError>;

    /// Broadcasts a signed transaction and returns its confirmation id.
    async fn submit_transaction(&self, transaction: &SolanaTransaction) -> Result<String, ChainError>;
}

pub fn parse_pubkey(address: &str) -> Result<Pubkey, ChainError> {
    Pubkey::from_str(address).map_err(|e| ChainError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

pub struct RpcChainClient {
    client: RpcClient,
    commitment: CommitmentConfig,
    signature_page_size: usize,
    transactions: TransactionCache,
}

impl RpcChainClient {
    /// Builds the client and checks that the endpoint answers. Up to
    /// `cache_capacity` parsed transactions are kept so that signatures
    /// already fetched are not requested again.
    pub async fn connect(
        config: &SolanaConfig,
        signature_page_size: usize,
        cache_capacity: NonZeroUsize,
    ) -> Result<Self, ChainError> {
        let client = config.create_rpc_client();
        let version = client.get_version().await?;
        info!(
            "Connected to Solana node endpoint={} version={}",
            config.rpc_url, version.solana_core
        );

        Ok(Self {
            client,
            commitment: config.commitment,
            signature_page_size,
            transactions: TransactionCache::new(cache_capacity),
        })
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.client.get_balance(address).await?)
    }

    async fn fetch_transaction(&self, owner: &str, signature: &str) -> Result<Transaction, ChainError> {
        let parsed_signature = Signature::from_str(signature)
            .map_err(|_| ChainError::InvalidSignature(signature.to_string()))?;

        let confirmed = self
            .client
            .get_transaction_with_config(
                &parsed_signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Json),
                    commitment: Some(self.commitment),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;

        parse_confirmed_transaction(owner, signature, &confirmed)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn transactions_for_address(&self, address: &str) -> Result<Vec<Transaction>, ChainError> {
        let pubkey = parse_pubkey(address)?;

        let statuses = self
            .client
            .get_signatures_for_address_with_config(
                &pubkey,
                GetConfirmedSignaturesForAddress2Config {
                    before: None,
                    until: None,
                    limit: Some(self.signature_page_size),
                    commitment: Some(self.commitment),
                },
            )
            .await?;

        let mut transactions = Vec::with_capacity(statuses.len());
        // Newest first from the node; walk backwards so callers see chain order
        for status in statuses.iter().rev() {
            if status.err.is_some() {
                debug!("Skipping failed transaction {} for {}", status.signature, address);
                continue;
            }

            let fetched = self
                .transactions
                .get_or_fetch(address, &status.signature, || {
                    self.fetch_transaction(address, &status.signature)
                })
                .await;

            match fetched {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => warn!("Failed to get transaction {}: {}", status.signature, e),
            }
        }

        Ok(transactions)
    }

    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn submit_transaction(&self, transaction: &SolanaTransaction) -> Result<String, ChainError> {
        let signature = self
            .client
            .send_transaction_with_config(
                transaction,
                RpcSendTransactionConfig {
                    skip_preflight: false,
                    preflight_commitment: Some(self.commitment.commitment),
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await?;

        Ok(signature.to_string())
    }
}
