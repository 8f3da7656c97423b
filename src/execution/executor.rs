use std::error::Error as _;
use std::sync::Arc;

use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use super::{error::ExecutionError, types::ExecutionOutcome};
use crate::chain::{ChainClient, Transaction, Wallet};
use crate::strategy::CopyStrategy;

/// Replays accepted swaps from the operator wallet.
///
/// Each call to [`TradeExecutor::process_transaction`] is independent; many
/// may run at once against the same wallet. Blockhash-based transactions do
/// not share a nonce, so signing needs no serialization.
#[derive(Clone)]
pub struct TradeExecutor {
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn Wallet>,
    strategy: Arc<CopyStrategy>,
}

impl TradeExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        wallet: Arc<dyn Wallet>,
        strategy: Arc<CopyStrategy>,
    ) -> Self {
        Self {
            chain,
            wallet,
            strategy,
        }
    }

    /// Copies `tx` if the strategy accepts it. Failures are logged and returned
    /// as an outcome, never propagated.
    pub async fn process_transaction(&self, shutdown: &CancellationToken, tx: &Transaction) -> ExecutionOutcome {
        if !self.strategy.should_copy_trade(tx) {
            debug!("Not copying {}", tx.signature);
            return ExecutionOutcome::Skipped;
        }

        // A started copy runs to completion; the orchestrator bounds it on shutdown
        if shutdown.is_cancelled() {
            info!("Shutdown requested, not copying {}", tx.signature);
            return ExecutionOutcome::Cancelled;
        }

        info!(
            "Copying trade signature={} from_token={} to_token={} from_amount={}",
            tx.signature, tx.from_token, tx.to_token, tx.from_amount
        );

        let amount = self.strategy.adjust_trade_amount(tx.from_amount);

        match self.execute(tx, amount).await {
            Ok(confirmation) => {
                info!(
                    "Trade executed successfully confirmation={} from_token={} to_token={} amount={}",
                    confirmation, tx.from_token, tx.to_token, amount
                );
                ExecutionOutcome::Submitted { confirmation, amount }
            }
            Err(e) => {
                error!(
                    "Copy trade abandoned signature={} stage={:?} error={} cause={}",
                    tx.signature,
                    e.stage(),
                    e,
                    e.source().map(ToString::to_string).unwrap_or_default()
                );
                ExecutionOutcome::Failed(e)
            }
        }
    }

    async fn execute(&self, tx: &Transaction, amount: u64) -> Result<String, ExecutionError> {
        let mut swap = self
            .wallet
            .build_swap_transaction(self.chain.as_ref(), &tx.from_token, &tx.to_token, amount)
            .await
            .map_err(ExecutionError::BuildFailed)?;

        self.wallet
            .sign(&mut swap)
            .map_err(ExecutionError::SigningFailed)?;

        self.chain
            .submit_transaction(&swap)
            .await
            .map_err(ExecutionError::SubmissionFailed)
    }
}
