use std::collections::HashSet;
use std::time::Duration;

use rust_decimal::Decimal;

/// How copied trades are sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizingMode {
    /// Copy the exact amount of the watched trade
    #[default]
    Mirror,
}

#[derive(Clone, Debug, Default)]
pub struct StrategyConfig {
    pub sizing: SizingMode,
    pub max_slippage: Decimal,    // percent, 1.0 = 1%
    pub min_trade_size: Decimal,  // raw units of the input token, inclusive
    pub max_trade_size: Decimal,  // raw units of the input token, inclusive
    pub trade_delay: Duration,    // read from config, not applied
    pub token_whitelist: HashSet<String>,
    pub token_blacklist: HashSet<String>,
}
