use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{cache::SeenSignatures, config::MonitorConfig};
use crate::chain::{ChainClient, Transaction};

/// Polls the watched wallets and hands new swaps to the pipeline.
pub struct WalletMonitor {
    chain: Arc<dyn ChainClient>,
    config: MonitorConfig,
    seen: SeenSignatures,
}

impl WalletMonitor {
    pub fn new(chain: Arc<dyn ChainClient>, config: MonitorConfig) -> Self {
        let seen = SeenSignatures::new(config.seen_cache_capacity, config.suppression_window);
        Self { chain, config, seen }
    }

    /// Runs polling rounds until `shutdown` fires.
    pub async fn start(&self, shutdown: CancellationToken, sender: mpsc::Sender<Arc<Transaction>>) {
        info!(
            "Starting wallet monitoring wallets={:?} interval={:?}",
            self.config.wallets, self.config.poll_interval
        );

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                emitted = self.poll_round(&shutdown, &sender) => {
                    if emitted > 0 {
                        debug!("Polling round emitted {} transactions", emitted);
                    }
                }
            }
        }

        info!("Stopping wallet monitoring");
    }

    /// One pass over every wallet, fetched concurrently. Returns the number of
    /// transactions queued.
    pub async fn poll_round(&self, shutdown: &CancellationToken, sender: &mpsc::Sender<Arc<Transaction>>) -> usize {
        let expired = self.seen.prune(Instant::now()).await;
        if expired > 0 {
            debug!("Pruned {} expired signatures, {} remembered", expired, self.seen.len().await);
        }

        let polls = self
            .config
            .wallets
            .iter()
            .map(|wallet| self.poll_wallet(wallet, shutdown, sender));

        join_all(polls).await.into_iter().sum()
    }

    async fn poll_wallet(
        &self,
        address: &str,
        shutdown: &CancellationToken,
        sender: &mpsc::Sender<Arc<Transaction>>,
    ) -> usize {
        let transactions = match self.chain.transactions_for_address(address).await {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!("Failed to get transactions wallet={} error={}", address, e);
                return 0;
            }
        };

        let mut emitted = 0;
        for transaction in transactions {
            // Parsing is per owner, so another watched wallet may see the swap side of this signature
            if !transaction.is_swap {
                debug!(
                    "Ignoring non-swap transaction wallet={} signature={}",
                    address, transaction.signature
                );
                continue;
            }

            if !self.seen.observe(&transaction.signature, Instant::now()).await {
                continue;
            }

            let signature = transaction.signature.clone();
            tokio::select! {
                _ = shutdown.cancelled() => return emitted,
                sent = sender.send(Arc::new(transaction)) => {
                    if sent.is_err() {
                        warn!("Handoff queue closed, dropping {}", signature);
                        return emitted;
                    }
                    info!("New transaction detected wallet={} signature={}", address, signature);
                    emitted += 1;
                }
            }
        }

        emitted
    }
}
