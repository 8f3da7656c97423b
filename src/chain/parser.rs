use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use log::debug;
use solana_account_decoder::parse_token::UiTokenAmount;
use solana_transaction_status::{
    option_serializer::OptionSerializer,
    EncodedConfirmedTransactionWithStatusMeta,
    EncodedTransaction,
    UiMessage,
    UiTransactionStatusMeta,
    UiTransactionTokenBalance,
};

use super::{
    error::ChainError,
    types::{BalanceActivity, SwapLegs, Transaction, WRAPPED_SOL_MINT},
};

// Native balance moves below this are rent deposits/refunds for token accounts, not trades
const RENT_NOISE_LAMPORTS: i128 = 5_000_000;

/// Turns an RPC transaction into the pipeline's model, as seen from `owner`.
pub fn parse_confirmed_transaction(
    owner: &str,
    signature: &str,
    confirmed: &EncodedConfirmedTransactionWithStatusMeta,
) -> Result<Transaction, ChainError> {
    let meta = confirmed
        .transaction
        .meta
        .as_ref()
        .ok_or_else(|| ChainError::MissingMetadata(signature.to_string()))?;

    let account_keys = account_keys(&confirmed.transaction.transaction);
    let owner_index = account_keys.iter().position(|key| key == owner);

    let pre: Option<Vec<UiTransactionTokenBalance>> = meta.pre_token_balances.clone().into();
    let post: Option<Vec<UiTransactionTokenBalance>> = meta.post_token_balances.clone().into();
    let token_deltas = owner_token_deltas(
        owner,
        pre.as_deref().unwrap_or_default(),
        post.as_deref().unwrap_or_default(),
    );
    let native = native_delta(owner_index, meta);

    let activity = classify(token_deltas, native);
    debug!("Parsed {} for {}: {:?}", signature, owner, activity);

    let block_time = confirmed
        .block_time
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    Ok(Transaction::from_activity(
        signature.to_string(),
        confirmed.slot,
        block_time,
        owner,
        activity,
    ))
}

fn account_keys(transaction: &EncodedTransaction) -> Vec<String> {
    match transaction {
        EncodedTransaction::Json(ui) => match &ui.message {
            UiMessage::Raw(raw) => raw.account_keys.clone(),
            UiMessage::Parsed(parsed) => parsed
                .account_keys
                .iter()
                .map(|account| account.pubkey.clone())
                .collect(),
        },
        encoded => encoded
            .decode()
            .map(|decoded| {
                decoded
                    .message
                    .static_account_keys()
                    .iter()
                    .map(|key| key.to_string())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn raw_amount(amount: &UiTokenAmount) -> i128 {
    amount.amount.parse::<i128>().unwrap_or(0)
}

/// Net change per mint over every token account held by `owner`.
pub fn owner_token_deltas(
    owner: &str,
    pre: &[UiTransactionTokenBalance],
    post: &[UiTransactionTokenBalance],
) -> HashMap<String, i128> {
    let owned = |balance: &&UiTransactionTokenBalance| {
        matches!(&balance.owner, OptionSerializer::Some(holder) if holder == owner)
    };

    let mut deltas: HashMap<String, i128> = HashMap::new();
    for balance in pre.iter().filter(owned) {
        *deltas.entry(balance.mint.clone()).or_default() -= raw_amount(&balance.ui_token_amount);
    }
    for balance in post.iter().filter(owned) {
        *deltas.entry(balance.mint.clone()).or_default() += raw_amount(&balance.ui_token_amount);
    }
    deltas
}

/// Lamport change of the owner, with the fee added back when the owner paid it.
fn native_delta(owner_index: Option<usize>, meta: &UiTransactionStatusMeta) -> i128 {
    let Some(index) = owner_index else {
        return 0;
    };
    let (Some(pre), Some(post)) = (meta.pre_balances.get(index), meta.post_balances.get(index)) else {
        return 0;
    };

    let mut delta = *post as i128 - *pre as i128;
    if index == 0 {
        delta += meta.fee as i128;
    }
    delta
}

/// Exactly one mint going out and one coming in is a swap.
pub fn classify(mut token_deltas: HashMap<String, i128>, native_lamports: i128) -> BalanceActivity {
    if native_lamports.abs() > RENT_NOISE_LAMPORTS {
        *token_deltas.entry(WRAPPED_SOL_MINT.to_string()).or_default() += native_lamports;
    }

    let moved: Vec<(String, i128)> = token_deltas
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .collect();

    let outgoing: Vec<&(String, i128)> = moved.iter().filter(|(_, delta)| *delta < 0).collect();
    let incoming: Vec<&(String, i128)> = moved.iter().filter(|(_, delta)| *delta > 0).collect();

    match (outgoing.as_slice(), incoming.as_slice()) {
        ([(from_token, spent)], [(to_token, received)]) => BalanceActivity::Swap(SwapLegs {
            from_token: from_token.clone(),
            to_token: to_token.clone(),
            from_amount: to_u64(spent.unsigned_abs()),
            to_amount: to_u64(received.unsigned_abs()),
        }),
        _ if moved.len() == 1 => {
            let (mint, delta) = moved[0].clone();
            BalanceActivity::Transfer { mint, delta }
        }
        _ => BalanceActivity::Unknown,
    }
}

fn to_u64(amount: u128) -> u64 {
    u64::try_from(amount).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use solana_sdk::pubkey::Pubkey;

    const OWNER: &str = "Watched1111111111111111111111111111111111111";
    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGqPTxfw6i1Zxqp8ow7mULV";

    fn token_balance(index: u8, mint: &str, owner: &str, amount: u64) -> Value {
        json!({
            "accountIndex": index,
            "mint": mint,
            "uiTokenAmount": {
                "uiAmount": null,
                "decimals": 6,
                "amount": amount.to_string(),
                "uiAmountString": amount.to_string(),
            },
            "owner": owner,
            "programId": TOKEN_PROGRAM,
        })
    }

    // Shaped like a getTransaction response with json encoding
    fn rpc_response(account_keys: &[String], meta: Value) -> EncodedConfirmedTransactionWithStatusMeta {
        serde_json::from_value(json!({
            "slot": 250_000_000u64,
            "blockTime": 1_700_000_000i64,
            "transaction": {
                "signatures": ["5j7s1QzqC9JeVzGdBhoq5N8xXvy1v3x9YvQ2GJZ8GQnK"],
                "message": {
                    "header": {
                        "numRequiredSignatures": 1,
                        "numReadonlySignedAccounts": 0,
                        "numReadonlyUnsignedAccounts": 1,
                    },
                    "accountKeys": account_keys,
                    "recentBlockhash": Pubkey::new_unique().to_string(),
                    "instructions": [],
                },
            },
            "meta": meta,
        }))
        .unwrap()
    }

    fn meta(fee: u64, pre_balances: &[u64], post_balances: &[u64], pre_tokens: Vec<Value>, post_tokens: Vec<Value>) -> Value {
        json!({
            "err": null,
            "status": { "Ok": null },
            "fee": fee,
            "preBalances": pre_balances,
            "postBalances": post_balances,
            "innerInstructions": [],
            "logMessages": [],
            "preTokenBalances": pre_tokens,
            "postTokenBalances": post_tokens,
            "rewards": [],
        })
    }

    #[test]
    fn sol_for_token_paid_by_owner_is_a_swap() {
        let owner = Pubkey::new_unique().to_string();
        let keys = vec![owner.clone(), Pubkey::new_unique().to_string(), TOKEN_PROGRAM.to_string()];
        // 1 SOL spent plus a 5000 lamport fee, 150 USDC received
        let confirmed = rpc_response(
            &keys,
            meta(
                5_000,
                &[10_000_000_000, 2_039_280, 1],
                &[8_999_995_000, 2_039_280, 1],
                vec![token_balance(1, USDC_MINT, &owner, 0)],
                vec![token_balance(1, USDC_MINT, &owner, 150_000_000)],
            ),
        );

        let tx = parse_confirmed_transaction(&owner, "S1", &confirmed).unwrap();

        assert!(tx.is_swap);
        assert_eq!(tx.signature, "S1");
        assert_eq!(tx.slot, 250_000_000);
        assert_eq!(tx.block_time, Utc.timestamp_opt(1_700_000_000, 0).single());
        assert_eq!(tx.from_token, WRAPPED_SOL_MINT);
        assert_eq!(tx.from_amount, 1_000_000_000);
        assert_eq!(tx.to_token, USDC_MINT);
        assert_eq!(tx.to_amount, 150_000_000);
        assert_eq!(tx.sender, owner);
    }

    #[test]
    fn owner_outside_account_keys_still_reports_token_swap() {
        let owner = Pubkey::new_unique().to_string();
        let payer = Pubkey::new_unique().to_string();
        let keys = vec![
            payer,
            Pubkey::new_unique().to_string(),
            Pubkey::new_unique().to_string(),
            TOKEN_PROGRAM.to_string(),
        ];
        // Only the owner's token accounts move; the payer's SOL change is ignored
        let confirmed = rpc_response(
            &keys,
            meta(
                5_000,
                &[3_000_000_000, 2_039_280, 2_039_280, 1],
                &[1_999_995_000, 2_039_280, 2_039_280, 1],
                vec![
                    token_balance(1, USDC_MINT, &owner, 1_000),
                    token_balance(2, BONK_MINT, &owner, 0),
                ],
                vec![
                    token_balance(1, USDC_MINT, &owner, 400),
                    token_balance(2, BONK_MINT, &owner, 77),
                ],
            ),
        );

        let tx = parse_confirmed_transaction(&owner, "S2", &confirmed).unwrap();

        assert!(tx.is_swap);
        assert_eq!(tx.from_token, USDC_MINT);
        assert_eq!(tx.from_amount, 600);
        assert_eq!(tx.to_token, BONK_MINT);
        assert_eq!(tx.to_amount, 77);
    }

    #[test]
    fn fee_only_transaction_is_not_a_swap() {
        let owner = Pubkey::new_unique().to_string();
        let keys = vec![owner.clone(), TOKEN_PROGRAM.to_string()];
        let confirmed = rpc_response(
            &keys,
            meta(5_000, &[1_000_000_000, 1], &[999_995_000, 1], vec![], vec![]),
        );

        let tx = parse_confirmed_transaction(&owner, "S3", &confirmed).unwrap();

        assert!(!tx.is_swap);
        assert_eq!(tx.amount, 0);
    }

    #[test]
    fn missing_meta_is_an_error() {
        let owner = Pubkey::new_unique().to_string();
        let confirmed = rpc_response(&[owner.clone()], Value::Null);

        match parse_confirmed_transaction(&owner, "S4", &confirmed) {
            Err(ChainError::MissingMetadata(signature)) => assert_eq!(signature, "S4"),
            other => panic!("expected missing metadata, got {other:?}"),
        }
    }

    fn balance(index: u8, mint: &str, owner: &str, amount: u64) -> UiTransactionTokenBalance {
        UiTransactionTokenBalance {
            account_index: index,
            mint: mint.to_string(),
            ui_token_amount: UiTokenAmount {
                ui_amount: None,
                decimals: 6,
                amount: amount.to_string(),
                ui_amount_string: String::new(),
            },
            owner: OptionSerializer::Some(owner.to_string()),
            program_id: OptionSerializer::Skip,
        }
    }

    #[test]
    fn token_deltas_only_count_the_owner() {
        let pre = vec![
            balance(1, "USDC", OWNER, 1_000),
            balance(2, "USDC", "pool", 9_000),
        ];
        let post = vec![
            balance(1, "USDC", OWNER, 400),
            balance(2, "USDC", "pool", 9_600),
            balance(3, "BONK", OWNER, 77),
        ];

        let deltas = owner_token_deltas(OWNER, &pre, &post);
        assert_eq!(deltas.get("USDC"), Some(&-600));
        assert_eq!(deltas.get("BONK"), Some(&77));
        assert_eq!(deltas.len(), 2);
    }

    #[test]
    fn token_for_token_is_a_swap() {
        let deltas = HashMap::from([("USDC".to_string(), -600), ("BONK".to_string(), 77)]);

        assert_eq!(
            classify(deltas, 0),
            BalanceActivity::Swap(SwapLegs {
                from_token: "USDC".into(),
                to_token: "BONK".into(),
                from_amount: 600,
                to_amount: 77,
            })
        );
    }

    #[test]
    fn native_sol_counts_as_wrapped_sol_leg() {
        let deltas = HashMap::from([("USDC".to_string(), 150_000_000)]);

        match classify(deltas, -1_000_000_000) {
            BalanceActivity::Swap(legs) => {
                assert_eq!(legs.from_token, WRAPPED_SOL_MINT);
                assert_eq!(legs.from_amount, 1_000_000_000);
                assert_eq!(legs.to_token, "USDC");
            }
            other => panic!("expected swap, got {other:?}"),
        }
    }

    #[test]
    fn rent_deposit_does_not_turn_a_receive_into_a_swap() {
        let deltas = HashMap::from([("BONK".to_string(), 5_000)]);

        assert_eq!(
            classify(deltas, -2_039_280),
            BalanceActivity::Transfer { mint: "BONK".into(), delta: 5_000 }
        );
    }

    #[test]
    fn multi_leg_movements_are_unknown() {
        let deltas = HashMap::from([
            ("USDC".to_string(), -10),
            ("BONK".to_string(), -10),
            ("JUP".to_string(), 5),
        ]);

        assert_eq!(classify(deltas, 0), BalanceActivity::Unknown);
        assert_eq!(classify(HashMap::new(), 0), BalanceActivity::Unknown);
    }
}
