use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{debug, info};
use solana_sdk::{
    message::Message,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
    transaction::Transaction as SolanaTransaction,
};
use zeroize::Zeroizing;

use super::{client::ChainClient, error::WalletError};
use crate::dex::{QuoteRequest, SwapRouter};

const SECRET_KEY_LENGTH: usize = 64;

/// The operator's trading account.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> String;

    fn pubkey(&self) -> Pubkey;

    fn sign(&self, transaction: &mut SolanaTransaction) -> Result<(), WalletError>;

    /// Unsigned transaction swapping `amount` of `from_token` into `to_token`.
    async fn build_swap_transaction(
        &self,
        chain: &dyn ChainClient,
        from_token: &str,
        to_token: &str,
        amount: u64,
    ) -> Result<SolanaTransaction, WalletError>;
}

pub struct KeypairWallet {
    keypair: Keypair,
    router: Arc<dyn SwapRouter>,
    slippage_bps: u16,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, router: Arc<dyn SwapRouter>, slippage_bps: u16) -> Self {
        info!("Wallet initialized address={}", keypair.pubkey());
        Self {
            keypair,
            router,
            slippage_bps,
        }
    }

    /// Accepts a 64-byte secret key encoded as base58 or base64.
    pub fn from_private_key(
        encoded: &str,
        router: Arc<dyn SwapRouter>,
        slippage_bps: u16,
    ) -> Result<Self, WalletError> {
        Ok(Self::new(decode_keypair(encoded)?, router, slippage_bps))
    }

    /// Reads a Solana CLI JSON keypair file.
    pub fn from_keypair_file(
        path: &str,
        router: Arc<dyn SwapRouter>,
        slippage_bps: u16,
    ) -> Result<Self, WalletError> {
        let keypair = read_keypair_file(path).map_err(|e| WalletError::KeypairFile {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(keypair, router, slippage_bps))
    }
}

fn decode_keypair(encoded: &str) -> Result<Keypair, WalletError> {
    let encoded = encoded.trim();

    let from_base58 = bs58::decode(encoded)
        .into_vec()
        .ok()
        .map(Zeroizing::new)
        .filter(|bytes| bytes.len() == SECRET_KEY_LENGTH);

    let bytes = match from_base58 {
        Some(bytes) => bytes,
        None => Zeroizing::new(
            BASE64
                .decode(encoded)
                .map_err(|_| WalletError::InvalidKey("neither base58 nor base64".to_string()))?,
        ),
    };

    if bytes.len() != SECRET_KEY_LENGTH {
        return Err(WalletError::InvalidKey(format!(
            "expected {} bytes, got {}",
            SECRET_KEY_LENGTH,
            bytes.len()
        )));
    }

    Keypair::from_bytes(&bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn address(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign(&self, transaction: &mut SolanaTransaction) -> Result<(), WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_sign(&[&self.keypair], blockhash)?;
        Ok(())
    }

    async fn build_swap_transaction(
        &self,
        chain: &dyn ChainClient,
        from_token: &str,
        to_token: &str,
        amount: u64,
    ) -> Result<SolanaTransaction, WalletError> {
        let payer = self.keypair.pubkey();

        let quote = self.router
            .quote(&QuoteRequest {
                input_mint: from_token.to_string(),
                output_mint: to_token.to_string(),
                amount,
                slippage_bps: self.slippage_bps,
            })
            .await?;

        let instructions = self.router.swap_instructions(&quote, &payer).await?;
        if instructions.is_empty() {
            return Err(WalletError::EmptyRoute {
                from_token: from_token.to_string(),
                to_token: to_token.to_string(),
            });
        }

        // Fetched last so the transaction has as much validity left as possible
        let blockhash = chain.latest_blockhash().await?;
        debug!(
            "Built swap {} -> {} amount={} expected_out={} instructions={}",
            from_token,
            to_token,
            amount,
            quote.out_amount,
            instructions.len()
        );

        let message = Message::new_with_blockhash(&instructions, Some(&payer), &blockhash);
        Ok(SolanaTransaction::new_unsigned(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, MockChainClient};
    use crate::dex::{MockSwapRouter, RouteError, SwapQuote};
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
    };

    fn quote_for(request: &QuoteRequest) -> SwapQuote {
        SwapQuote {
            input_mint: request.input_mint.clone(),
            output_mint: request.output_mint.clone(),
            in_amount: request.amount,
            out_amount: request.amount / 2,
            price_impact_pct: 0.0,
            route: serde_json::Value::Null,
        }
    }

    fn router_with_one_instruction() -> MockSwapRouter {
        let mut router = MockSwapRouter::new();
        router
            .expect_quote()
            .withf(|request| request.amount == 500 && request.slippage_bps == 100)
            .returning(|request| Ok(quote_for(request)));
        router.expect_swap_instructions().returning(|_, payer| {
            Ok(vec![Instruction::new_with_bytes(
                Pubkey::new_unique(),
                &[7, 7],
                vec![AccountMeta::new(*payer, true)],
            )])
        });
        router
    }

    #[test]
    fn decodes_base58_and_base64_keys() {
        let keypair = Keypair::new();
        let router: Arc<dyn SwapRouter> = Arc::new(MockSwapRouter::new());

        let from_base58 =
            KeypairWallet::from_private_key(&keypair.to_base58_string(), router.clone(), 50).unwrap();
        assert_eq!(from_base58.pubkey(), keypair.pubkey());

        let encoded = BASE64.encode(keypair.to_bytes());
        let from_base64 = KeypairWallet::from_private_key(&encoded, router, 50).unwrap();
        assert_eq!(from_base64.address(), keypair.pubkey().to_string());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(decode_keypair("!!not a key!!"), Err(WalletError::InvalidKey(_))));
        assert!(matches!(decode_keypair(&BASE64.encode([1u8; 32])), Err(WalletError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn builds_and_signs_swap() {
        let blockhash = Hash::new_unique();
        let mut chain = MockChainClient::new();
        chain.expect_latest_blockhash().times(1).returning(move || Ok(blockhash));

        let wallet = KeypairWallet::new(Keypair::new(), Arc::new(router_with_one_instruction()), 100);

        let mut transaction = wallet
            .build_swap_transaction(&chain, "SOL", "USDC", 500)
            .await
            .unwrap();
        assert_eq!(transaction.message.recent_blockhash, blockhash);
        assert_eq!(transaction.message.account_keys[0], wallet.pubkey());
        assert!(!transaction.is_signed());

        wallet.sign(&mut transaction).unwrap();
        assert!(transaction.is_signed());
        assert!(transaction.verify().is_ok());
    }

    #[tokio::test]
    async fn route_failure_skips_blockhash_lookup() {
        let mut chain = MockChainClient::new();
        chain.expect_latest_blockhash().times(0);

        let mut router = MockSwapRouter::new();
        router.expect_quote().returning(|request| {
            Err(RouteError::NoRoute {
                input_mint: request.input_mint.clone(),
                output_mint: request.output_mint.clone(),
            })
        });

        let wallet = KeypairWallet::new(Keypair::new(), Arc::new(router), 100);
        let result = wallet.build_swap_transaction(&chain, "SOL", "USDC", 500).await;
        assert!(matches!(result, Err(WalletError::Route(RouteError::NoRoute { .. }))));
    }

    #[tokio::test]
    async fn blockhash_failure_is_reported() {
        let mut chain = MockChainClient::new();
        chain
            .expect_latest_blockhash()
            .returning(|| Err(ChainError::RpcError("node unavailable".into())));

        let wallet = KeypairWallet::new(Keypair::new(), Arc::new(router_with_one_instruction()), 100);
        let result = wallet.build_swap_transaction(&chain, "SOL", "USDC", 500).await;
        assert!(matches!(result, Err(WalletError::Chain(_))));
    }
}
