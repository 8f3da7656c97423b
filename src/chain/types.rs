use chrono::{DateTime, Utc};

/// Mint used for native SOL legs of a swap.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// A parsed on-chain transaction observed on a watched wallet.
///
/// Built once by the chain client and never mutated afterwards; the pipeline
/// passes it around as `Arc<Transaction>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    pub signature: String,
    pub block_time: Option<DateTime<Utc>>,
    pub slot: u64,

    // Generic transfer fields, only filled when the balance changes allow it
    pub sender: String,
    pub receiver: String,
    pub token_mint: String,
    pub amount: u64,

    // Swap legs, meaningful only when `is_swap` is set
    pub is_swap: bool,
    pub from_token: String,
    pub to_token: String,
    pub from_amount: u64,
    pub to_amount: u64,
}

/// Input and output legs of a detected swap, in raw token units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapLegs {
    pub from_token: String,
    pub to_token: String,
    pub from_amount: u64,
    pub to_amount: u64,
}

/// What the balance changes of a transaction say about the watched owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalanceActivity {
    Swap(SwapLegs),
    Transfer { mint: String, delta: i128 },
    Unknown,
}

impl Transaction {
    pub fn from_activity(
        signature: String,
        slot: u64,
        block_time: Option<DateTime<Utc>>,
        owner: &str,
        activity: BalanceActivity,
    ) -> Self {
        let base = Self {
            signature,
            slot,
            block_time,
            ..Self::default()
        };

        match activity {
            BalanceActivity::Swap(legs) => Self {
                sender: owner.to_string(),
                receiver: owner.to_string(),
                token_mint: legs.from_token.clone(),
                amount: legs.from_amount,
                is_swap: true,
                from_token: legs.from_token,
                to_token: legs.to_token,
                from_amount: legs.from_amount,
                to_amount: legs.to_amount,
                ..base
            },
            BalanceActivity::Transfer { mint, delta } => {
                let (sender, receiver) = if delta < 0 {
                    (owner.to_string(), String::new())
                } else {
                    (String::new(), owner.to_string())
                };
                Self {
                    sender,
                    receiver,
                    token_mint: mint,
                    amount: u64::try_from(delta.unsigned_abs()).unwrap_or(u64::MAX),
                    ..base
                }
            }
            BalanceActivity::Unknown => base,
        }
    }
}
