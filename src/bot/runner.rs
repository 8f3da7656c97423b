use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use crate::chain::Transaction;
use crate::execution::{ExecutionOutcome, TradeExecutor};
use crate::monitor::WalletMonitor;

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub queue_capacity: usize,   // Pending transactions between monitor and executor
    pub drain_timeout: Duration, // Grace period for in-flight copies on shutdown
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Counts of what happened to every dispatched transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: usize,
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunSummary {
    fn record(&mut self, joined: Result<ExecutionOutcome, JoinError>) {
        match joined {
            Ok(ExecutionOutcome::Submitted { .. }) => self.submitted += 1,
            Ok(ExecutionOutcome::Skipped) => self.skipped += 1,
            Ok(ExecutionOutcome::Failed(_)) => self.failed += 1,
            Ok(ExecutionOutcome::Cancelled) => self.cancelled += 1,
            Err(e) if e.is_cancelled() => self.cancelled += 1,
            Err(e) => {
                error!("Copy task panicked: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Wires the wallet monitor to the trade executor.
pub struct CopyTradingBot {
    monitor: Arc<WalletMonitor>,
    executor: Arc<TradeExecutor>,
    config: BotConfig,
}

impl CopyTradingBot {
    pub fn new(monitor: Arc<WalletMonitor>, executor: Arc<TradeExecutor>, config: BotConfig) -> Self {
        Self {
            monitor,
            executor,
            config,
        }
    }

    /// Runs until `shutdown` fires, then stops the monitor and waits up to
    /// the drain timeout for copies already in flight.
    pub async fn run(&self, shutdown: CancellationToken) -> RunSummary {
        info!("Starting copy trading bot");

        let (sender, mut receiver) = mpsc::channel::<Arc<Transaction>>(self.config.queue_capacity);

        let monitor = Arc::clone(&self.monitor);
        let monitor_shutdown = shutdown.clone();
        let monitor_handle = tokio::spawn(async move { monitor.start(monitor_shutdown, sender).await });

        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => summary.record(joined),

                received = receiver.recv() => match received {
                    Some(transaction) => {
                        summary.dispatched += 1;
                        debug!("Dispatching {}", transaction.signature);

                        let executor = Arc::clone(&self.executor);
                        let task_shutdown = shutdown.clone();
                        tasks.spawn(async move {
                            executor.process_transaction(&task_shutdown, &transaction).await
                        });
                    }
                    None => {
                        warn!("Monitor stopped unexpectedly");
                        break;
                    }
                },
            }
        }

        info!("Shutting down, {} copies in flight", tasks.len());

        if let Err(e) = monitor_handle.await {
            error!("Monitor task failed: {}", e);
        }

        receiver.close();
        let mut discarded = 0;
        while receiver.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            info!("Discarded {} queued transactions", discarded);
        }

        let drain = async {
            while let Some(joined) = tasks.join_next().await {
                summary.record(joined);
            }
        };
        if timeout(self.config.drain_timeout, drain).await.is_err() {
            warn!(
                "Drain timeout of {:?} elapsed, aborting {} copies",
                self.config.drain_timeout,
                tasks.len()
            );
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                summary.record(joined);
            }
        }

        info!(
            "Copy trading bot stopped dispatched={} submitted={} skipped={} failed={} cancelled={}",
            summary.dispatched, summary.submitted, summary.skipped, summary.failed, summary.cancelled
        );
        summary
    }
}
