use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::config::ConfigError;

const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
const TESTNET_RPC_URL: &str = "https://api.testnet.solana.com";

#[derive(Clone, Debug)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
}

impl SolanaConfig {
    /// Resolves the endpoint (explicit, or the network's public one) and commitment level.
    pub fn resolve(
        endpoint: Option<&str>,
        network: &str,
        commitment: &str,
    ) -> Result<Self, ConfigError> {
        let rpc_url = match endpoint.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => url.to_string(),
            None => Self::network_url(network)?.to_string(),
        };

        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "solana.endpoint must be an http(s) URL, got {}",
                rpc_url
            )));
        }

        Ok(Self {
            rpc_url,
            commitment: Self::parse_commitment(commitment)?,
        })
    }

    fn network_url(network: &str) -> Result<&'static str, ConfigError> {
        match network.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(MAINNET_RPC_URL),
            "devnet" => Ok(DEVNET_RPC_URL),
            "testnet" => Ok(TESTNET_RPC_URL),
            other => Err(ConfigError::Invalid(format!("unknown solana.network {}", other))),
        }
    }

    fn parse_commitment(level: &str) -> Result<CommitmentConfig, ConfigError> {
        match level.to_ascii_lowercase().as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::Invalid(format!("unknown solana.commitment {}", other))),
        }
    }

    // Create RPC client
    pub fn create_rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }
}
