mod cache;
mod config;
mod watcher;

pub use cache::SeenSignatures;
pub use config::{MonitorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SUPPRESSION_WINDOW};
pub use watcher::WalletMonitor;
