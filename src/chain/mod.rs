mod cache;
mod client;
mod error;
pub mod parser;
mod types;
mod wallet;

pub use cache::TransactionCache;
pub use client::{parse_pubkey, ChainClient, RpcChainClient};
#[cfg(test)]
pub use client::MockChainClient;
pub use error::{ChainError, WalletError};
pub use types::{BalanceActivity, SwapLegs, Transaction, WRAPPED_SOL_MINT};
pub use wallet::{KeypairWallet, Wallet};
