use async_trait::async_trait;
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::types::{QuoteRequest, SwapQuote};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No route for {input_mint} -> {output_mint}")]
    NoRoute {
        input_mint: String,
        output_mint: String,
    },

    #[error("Invalid router response: {0}")]
    InvalidResponse(String),
}

/// Route discovery and instruction building for a swap.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SwapRouter: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<SwapQuote, RouteError>;

    /// Instructions executing `quote` with `payer` as the trading account.
    async fn swap_instructions(
        &self,
        quote: &SwapQuote,
        payer: &Pubkey,
    ) -> Result<Vec<Instruction>, RouteError>;
}
