use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::types::{SizingMode, StrategyConfig};
use crate::chain::Transaction;

/// Decides which watched trades get copied and at what size.
///
/// Holds no state besides its configuration; every method is a pure function
/// of its input, so one instance is shared by all executions.
#[derive(Clone, Debug)]
pub struct CopyStrategy {
    config: StrategyConfig,
}

impl CopyStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn should_copy_trade(&self, tx: &Transaction) -> bool {
        if !tx.is_swap {
            debug!("Transaction {} skipped: not a swap", tx.signature);
            return false;
        }

        let whitelist = &self.config.token_whitelist;
        if !whitelist.is_empty()
            && (!whitelist.contains(&tx.from_token) || !whitelist.contains(&tx.to_token))
        {
            debug!(
                "Transaction {} skipped: token not in whitelist from_token={} to_token={}",
                tx.signature, tx.from_token, tx.to_token
            );
            return false;
        }

        let blacklist = &self.config.token_blacklist;
        if blacklist.contains(&tx.from_token) || blacklist.contains(&tx.to_token) {
            debug!(
                "Transaction {} skipped: token in blacklist from_token={} to_token={}",
                tx.signature, tx.from_token, tx.to_token
            );
            return false;
        }

        let amount = Decimal::from(tx.from_amount);
        if amount < self.config.min_trade_size {
            debug!(
                "Transaction {} skipped: trade size too small amount={} min_trade_size={}",
                tx.signature, tx.from_amount, self.config.min_trade_size
            );
            return false;
        }

        if amount > self.config.max_trade_size {
            debug!(
                "Transaction {} skipped: trade size too large amount={} max_trade_size={}",
                tx.signature, tx.from_amount, self.config.max_trade_size
            );
            return false;
        }

        true
    }

    pub fn adjust_trade_amount(&self, original_amount: u64) -> u64 {
        match self.config.sizing {
            SizingMode::Mirror => original_amount,
        }
    }

    /// `max_slippage` expressed in basis points for the router.
    pub fn slippage_bps(&self) -> u16 {
        (self.config.max_slippage * Decimal::ONE_HUNDRED)
            .round()
            .to_u16()
            .unwrap_or(u16::MAX)
    }
}
