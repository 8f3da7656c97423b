use super::error::ExecutionError;

/// Result of handing one observed transaction to the executor.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Rejected by the strategy; nothing was sent to the chain
    Skipped,
    /// Shutdown was already requested before the copy started
    Cancelled,
    Submitted {
        confirmation: String,
        amount: u64,
    },
    Failed(ExecutionError),
}
