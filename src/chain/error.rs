use solana_client::client_error::ClientError;
use solana_sdk::signer::SignerError;
use thiserror::Error;

use crate::dex::RouteError;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress {
        address: String,
        reason: String,
    },

    #[error("Invalid signature {0}")]
    InvalidSignature(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction {0} has no status metadata")]
    MissingMetadata(String),
}

impl From<ClientError> for ChainError {
    fn from(error: ClientError) -> Self {
        ChainError::RpcError(error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Failed to read keypair file {path}: {reason}")]
    KeypairFile {
        path: String,
        reason: String,
    },

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Router returned no instructions for {from_token} -> {to_token}")]
    EmptyRoute {
        from_token: String,
        to_token: String,
    },

    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
}
