mod runner;

pub use runner::{BotConfig, CopyTradingBot, RunSummary};
