pub mod bot;
pub mod chain;
pub mod config;
pub mod dex;
pub mod execution;
pub mod monitor;
pub mod solana_config;
pub mod strategy;

pub use solana_config::SolanaConfig;

// Re-export key types
pub use bot::{BotConfig, CopyTradingBot, RunSummary};

pub use chain::{
    ChainClient,
    RpcChainClient,
    Transaction,
    KeypairWallet,
    Wallet,
};

pub use config::{AppConfig, ConfigError};

pub use execution::{
    ExecutionOutcome,
    TradeExecutor,
};

pub use monitor::{MonitorConfig, WalletMonitor};

pub use strategy::{
    CopyStrategy,
    StrategyConfig,
};
