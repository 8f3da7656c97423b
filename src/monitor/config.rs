use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub wallets: Vec<String>,                 // Watched wallet addresses
    pub poll_interval: Duration,              // Time between polling rounds
    pub suppression_window: Duration,         // How long a seen signature stays suppressed
    pub seen_cache_capacity: NonZeroUsize,    // Upper bound on remembered signatures
}

impl MonitorConfig {
    pub fn new(wallets: Vec<String>) -> Self {
        Self {
            wallets,
            poll_interval: DEFAULT_POLL_INTERVAL,
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
            seen_cache_capacity: NonZeroUsize::new(100_000).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
