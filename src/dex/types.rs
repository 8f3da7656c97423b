/// What the executor wants to swap, in raw token units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
}

/// A priced route returned by the router.
///
/// `route` is the router's own representation and is handed back unchanged
/// when asking for instructions.
#[derive(Clone, Debug, PartialEq)]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: f64,
    pub route: serde_json::Value,
}
