use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::bot::BotConfig;
use crate::chain::parse_pubkey;
use crate::dex::JUPITER_API_URL;
use crate::monitor::{MonitorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SUPPRESSION_WINDOW};
use crate::strategy::{SizingMode, StrategyConfig};
use crate::SolanaConfig;

pub const CONFIG_PATH: &str = "config.toml";
pub const PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

// getSignaturesForAddress refuses larger pages
const MAX_SIGNATURE_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

// Raw file layout

#[derive(Debug, Clone, Deserialize)]
struct Settings {
    #[serde(default)]
    solana: SolanaSettings,
    #[serde(default)]
    wallet: WalletSettings,
    monitoring: MonitoringSettings,
    strategy: StrategySettings,
    #[serde(default)]
    execution: ExecutionSettings,
}

#[derive(Debug, Clone, Deserialize)]
struct SolanaSettings {
    endpoint: Option<String>,
    #[serde(default = "default_network")]
    network: String,
    #[serde(default = "default_commitment")]
    commitment: String,
}

impl Default for SolanaSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            network: default_network(),
            commitment: default_commitment(),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
struct WalletSettings {
    private_key: Option<String>,
    keypair_path: Option<String>,
}

impl fmt::Debug for WalletSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSettings")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("keypair_path", &self.keypair_path)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MonitoringSettings {
    wallets: Vec<String>,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_signature_page_size")]
    signature_page_size: usize,
    #[serde(default = "default_suppression_window_secs")]
    suppression_window_secs: u64,
    #[serde(default = "default_seen_cache_capacity")]
    seen_cache_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct StrategySettings {
    #[serde(rename = "type", default = "default_strategy_type")]
    kind: String,
    #[serde(default = "default_max_slippage")]
    max_slippage: f64,
    min_trade_size: f64,
    max_trade_size: f64,
    #[serde(default)]
    trade_delay_ms: u64,
    #[serde(default)]
    token_whitelist: Vec<String>,
    #[serde(default)]
    token_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExecutionSettings {
    #[serde(default = "default_router_url")]
    router_url: String,
    #[serde(default = "default_queue_capacity")]
    queue_capacity: usize,
    #[serde(default = "default_drain_timeout_secs")]
    drain_timeout_secs: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            router_url: default_router_url(),
            queue_capacity: default_queue_capacity(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_network() -> String { "mainnet".to_string() }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_poll_interval_secs() -> u64 { DEFAULT_POLL_INTERVAL.as_secs() }
fn default_signature_page_size() -> usize { 20 }
fn default_suppression_window_secs() -> u64 { DEFAULT_SUPPRESSION_WINDOW.as_secs() }
fn default_seen_cache_capacity() -> usize { 100_000 }
fn default_strategy_type() -> String { "mirror".to_string() }
fn default_max_slippage() -> f64 { 1.0 }
fn default_router_url() -> String { JUPITER_API_URL.to_string() }
fn default_queue_capacity() -> usize { 100 }
fn default_drain_timeout_secs() -> u64 { 30 }

// Validated configuration

/// Where the operator key comes from.
pub enum WalletSource {
    PrivateKey(Zeroizing<String>),
    KeypairFile(String),
}

impl fmt::Debug for WalletSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSource::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            WalletSource::KeypairFile(path) => f.debug_tuple("KeypairFile").field(path).finish(),
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub solana: SolanaConfig,
    pub wallet: WalletSource,
    pub monitor: MonitorConfig,
    pub signature_page_size: usize,
    pub strategy: StrategyConfig,
    pub router_url: String,
    pub bot: BotConfig,
}

impl AppConfig {
    /// Reads `path`, with the private key optionally taken from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let env_key = std::env::var(PRIVATE_KEY_ENV).ok().map(Zeroizing::new);
        Self::from_toml_str(&content, env_key)
    }

    pub fn from_toml_str(content: &str, env_private_key: Option<Zeroizing<String>>) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;

        let solana = SolanaConfig::resolve(
            settings.solana.endpoint.as_deref(),
            &settings.solana.network,
            &settings.solana.commitment,
        )?;

        Ok(Self {
            solana,
            wallet: wallet_source(settings.wallet, env_private_key)?,
            signature_page_size: signature_page_size(&settings.monitoring)?,
            monitor: monitor_config(settings.monitoring)?,
            strategy: strategy_config(settings.strategy)?,
            router_url: router_url(&settings.execution)?,
            bot: bot_config(&settings.execution)?,
        })
    }
}

fn wallet_source(
    settings: WalletSettings,
    env_private_key: Option<Zeroizing<String>>,
) -> Result<WalletSource, ConfigError> {
    let file_key = settings.private_key.map(Zeroizing::new);

    match (env_private_key.or(file_key), settings.keypair_path) {
        (Some(key), _) if !key.trim().is_empty() => Ok(WalletSource::PrivateKey(key)),
        (_, Some(path)) if !path.trim().is_empty() => Ok(WalletSource::KeypairFile(path)),
        _ => Err(invalid(format!(
            "no key material: set wallet.private_key, wallet.keypair_path or {}",
            PRIVATE_KEY_ENV
        ))),
    }
}

fn signature_page_size(settings: &MonitoringSettings) -> Result<usize, ConfigError> {
    match settings.signature_page_size {
        size @ 1..=MAX_SIGNATURE_PAGE_SIZE => Ok(size),
        size => Err(invalid(format!(
            "monitoring.signature_page_size must be 1..={}, got {}",
            MAX_SIGNATURE_PAGE_SIZE, size
        ))),
    }
}

fn monitor_config(settings: MonitoringSettings) -> Result<MonitorConfig, ConfigError> {
    let mut seen = HashSet::new();
    let mut wallets = Vec::with_capacity(settings.wallets.len());
    for wallet in settings.wallets {
        let wallet = wallet.trim().to_string();
        parse_pubkey(&wallet).map_err(|e| invalid(format!("monitoring.wallets: {}", e)))?;
        if seen.insert(wallet.clone()) {
            wallets.push(wallet);
        }
    }
    if wallets.is_empty() {
        return Err(invalid("monitoring.wallets must list at least one address"));
    }

    if settings.poll_interval_secs == 0 {
        return Err(invalid("monitoring.poll_interval_secs must be positive"));
    }
    if settings.suppression_window_secs == 0 {
        return Err(invalid("monitoring.suppression_window_secs must be positive"));
    }
    let seen_cache_capacity = NonZeroUsize::new(settings.seen_cache_capacity)
        .ok_or_else(|| invalid("monitoring.seen_cache_capacity must be positive"))?;

    Ok(MonitorConfig {
        wallets,
        poll_interval: Duration::from_secs(settings.poll_interval_secs),
        suppression_window: Duration::from_secs(settings.suppression_window_secs),
        seen_cache_capacity,
    })
}

fn decimal(name: &str, value: f64) -> Result<Decimal, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("strategy.{} must be a non-negative number, got {}", name, value)));
    }
    Decimal::from_f64(value).ok_or_else(|| invalid(format!("strategy.{} is out of range", name)))
}

fn strategy_config(settings: StrategySettings) -> Result<StrategyConfig, ConfigError> {
    let sizing = match settings.kind.to_ascii_lowercase().as_str() {
        "mirror" => SizingMode::Mirror,
        other => return Err(invalid(format!("unsupported strategy.type {}", other))),
    };

    let max_slippage = decimal("max_slippage", settings.max_slippage)?;
    if max_slippage > Decimal::ONE_HUNDRED {
        return Err(invalid("strategy.max_slippage is a percentage and cannot exceed 100"));
    }

    let min_trade_size = decimal("min_trade_size", settings.min_trade_size)?;
    let max_trade_size = decimal("max_trade_size", settings.max_trade_size)?;
    if min_trade_size > max_trade_size {
        return Err(invalid(format!(
            "strategy.min_trade_size {} exceeds max_trade_size {}",
            min_trade_size, max_trade_size
        )));
    }

    Ok(StrategyConfig {
        sizing,
        max_slippage,
        min_trade_size,
        max_trade_size,
        trade_delay: Duration::from_millis(settings.trade_delay_ms),
        token_whitelist: settings.token_whitelist.into_iter().collect(),
        token_blacklist: settings.token_blacklist.into_iter().collect(),
    })
}

fn router_url(settings: &ExecutionSettings) -> Result<String, ConfigError> {
    let url = settings.router_url.trim();
    if url.is_empty() {
        return Err(invalid("execution.router_url must not be empty"));
    }
    Ok(url.to_string())
}

fn bot_config(settings: &ExecutionSettings) -> Result<BotConfig, ConfigError> {
    if settings.queue_capacity == 0 {
        return Err(invalid("execution.queue_capacity must be positive"));
    }
    Ok(BotConfig {
        queue_capacity: settings.queue_capacity,
        drain_timeout: Duration::from_secs(settings.drain_timeout_secs),
    })
}
