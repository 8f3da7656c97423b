use std::str::FromStr;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use super::{
    router::{RouteError, SwapRouter},
    types::{QuoteRequest, SwapQuote},
};

pub const JUPITER_API_URL: &str = "https://lite-api.jup.ag/swap/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterQuote {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInstructionsResponse {
    #[serde(default)]
    token_ledger_instruction: Option<JupiterInstruction>,
    #[serde(default)]
    compute_budget_instructions: Vec<JupiterInstruction>,
    #[serde(default)]
    setup_instructions: Vec<JupiterInstruction>,
    swap_instruction: JupiterInstruction,
    #[serde(default)]
    cleanup_instruction: Option<JupiterInstruction>,
    #[serde(default)]
    address_lookup_table_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterInstruction {
    program_id: String,
    accounts: Vec<JupiterAccount>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterAccount {
    pubkey: String,
    is_signer: bool,
    is_writable: bool,
}

/// Routes swaps through the Jupiter aggregator API.
pub struct JupiterRouter {
    base_url: String,
    http_client: reqwest::Client,
}

impl JupiterRouter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SwapRouter for JupiterRouter {
    async fn quote(&self, request: &QuoteRequest) -> Result<SwapQuote, RouteError> {
        let url = format!("{}/quote", self.base_url);

        let response = self.http_client
            .get(&url)
            .query(&[
                ("inputMint", request.input_mint.clone()),
                ("outputMint", request.output_mint.clone()),
                ("amount", request.amount.to_string()),
                ("slippageBps", request.slippage_bps.to_string()),
                ("asLegacyTransaction", "true".to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RouteError::NoRoute {
                input_mint: request.input_mint.clone(),
                output_mint: request.output_mint.clone(),
            });
        }

        let raw = response
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        parse_quote(raw)
    }

    async fn swap_instructions(
        &self,
        quote: &SwapQuote,
        payer: &Pubkey,
    ) -> Result<Vec<Instruction>, RouteError> {
        let url = format!("{}/swap-instructions", self.base_url);

        let response = self.http_client
            .post(&url)
            .json(&json!({
                "quoteResponse": quote.route,
                "userPublicKey": payer.to_string(),
                "wrapAndUnwrapSol": true,
                "asLegacyTransaction": true,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<SwapInstructionsResponse>()
            .await?;

        into_instructions(response)
    }
}

fn parse_quote(raw: serde_json::Value) -> Result<SwapQuote, RouteError> {
    let quote: JupiterQuote = serde_json::from_value(raw.clone())
        .map_err(|e| RouteError::InvalidResponse(format!("quote: {}", e)))?;

    let parse_amount = |field: &str, value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| RouteError::InvalidResponse(format!("{} is not an amount: {}", field, value)))
    };

    let quote = SwapQuote {
        in_amount: parse_amount("inAmount", &quote.in_amount)?,
        out_amount: parse_amount("outAmount", &quote.out_amount)?,
        price_impact_pct: quote
            .price_impact_pct
            .as_deref()
            .and_then(|pct| pct.parse::<f64>().ok())
            .unwrap_or_default(),
        input_mint: quote.input_mint,
        output_mint: quote.output_mint,
        route: raw,
    };
    debug!(
        "Jupiter quote {} -> {}: in={} out={} impact={}%",
        quote.input_mint, quote.output_mint, quote.in_amount, quote.out_amount, quote.price_impact_pct
    );

    Ok(quote)
}

fn into_instructions(response: SwapInstructionsResponse) -> Result<Vec<Instruction>, RouteError> {
    // Lookup tables need a versioned transaction
    if !response.address_lookup_table_addresses.is_empty() {
        return Err(RouteError::InvalidResponse(format!(
            "route needs {} address lookup tables",
            response.address_lookup_table_addresses.len()
        )));
    }

    response
        .compute_budget_instructions
        .into_iter()
        .chain(response.token_ledger_instruction)
        .chain(response.setup_instructions)
        .chain(std::iter::once(response.swap_instruction))
        .chain(response.cleanup_instruction)
        .map(to_instruction)
        .collect()
}

fn to_instruction(instruction: JupiterInstruction) -> Result<Instruction, RouteError> {
    let parse_key = |key: &str| {
        Pubkey::from_str(key).map_err(|_| RouteError::InvalidResponse(format!("bad pubkey {}", key)))
    };

    let accounts = instruction
        .accounts
        .iter()
        .map(|account| {
            Ok(AccountMeta {
                pubkey: parse_key(&account.pubkey)?,
                is_signer: account.is_signer,
                is_writable: account.is_writable,
            })
        })
        .collect::<Result<Vec<_>, RouteError>>()?;

    let data = BASE64
        .decode(&instruction.data)
        .map_err(|e| RouteError::InvalidResponse(format!("instruction data: {}", e)))?;

    Ok(Instruction {
        program_id: parse_key(&instruction.program_id)?,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction_json(program: &Pubkey, account: &Pubkey, data: &[u8]) -> serde_json::Value {
        json!({
            "programId": program.to_string(),
            "accounts": [{ "pubkey": account.to_string(), "isSigner": true, "isWritable": true }],
            "data": BASE64.encode(data),
        })
    }

    #[test]
    fn default_base_is_the_current_swap_api() {
        assert_eq!(JUPITER_API_URL, "https://lite-api.jup.ag/swap/v1");

        let router = JupiterRouter::new(format!("{}/", JUPITER_API_URL));
        assert_eq!(router.base_url, JUPITER_API_URL);
    }

    #[test]
    fn parses_quote_amounts() {
        let raw = json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "inAmount": "500",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "outAmount": "73",
            "priceImpactPct": "0.0012",
            "routePlan": [],
        });

        let quote = parse_quote(raw.clone()).unwrap();
        assert_eq!(quote.in_amount, 500);
        assert_eq!(quote.out_amount, 73);
        assert!((quote.price_impact_pct - 0.0012).abs() < f64::EPSILON);
        assert_eq!(quote.route, raw);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let raw = json!({
            "inputMint": "A", "inAmount": "lots", "outputMint": "B", "outAmount": "1",
        });
        assert!(matches!(parse_quote(raw), Err(RouteError::InvalidResponse(_))));
    }

    #[test]
    fn keeps_instruction_order() {
        let payer = Pubkey::new_unique();
        let budget = Pubkey::new_unique();
        let swap = Pubkey::new_unique();
        let cleanup = Pubkey::new_unique();

        let response: SwapInstructionsResponse = serde_json::from_value(json!({
            "computeBudgetInstructions": [instruction_json(&budget, &payer, &[1])],
            "setupInstructions": [],
            "swapInstruction": instruction_json(&swap, &payer, &[2, 3]),
            "cleanupInstruction": instruction_json(&cleanup, &payer, &[4]),
            "addressLookupTableAddresses": [],
        }))
        .unwrap();

        let instructions = into_instructions(response).unwrap();
        let programs: Vec<Pubkey> = instructions.iter().map(|ix| ix.program_id).collect();
        assert_eq!(programs, vec![budget, swap, cleanup]);
        assert_eq!(instructions[1].data, vec![2, 3]);
        assert!(instructions[1].accounts[0].is_signer);
    }

    #[test]
    fn rejects_routes_needing_lookup_tables() {
        let payer = Pubkey::new_unique();
        let response: SwapInstructionsResponse = serde_json::from_value(json!({
            "swapInstruction": instruction_json(&Pubkey::new_unique(), &payer, &[1]),
            "addressLookupTableAddresses": [Pubkey::new_unique().to_string()],
        }))
        .unwrap();

        assert!(into_instructions(response).is_err());
    }
}
