use thiserror::Error;

use crate::chain::{ChainError, WalletError};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to build swap transaction")]
    BuildFailed(#[source] WalletError),

    #[error("Failed to sign transaction")]
    SigningFailed(#[source] WalletError),

    #[error("Failed to submit transaction")]
    SubmissionFailed(#[source] ChainError),
}

/// Which step of the copy pipeline an error came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    Build,
    Sign,
    Submit,
}

impl ExecutionError {
    pub fn stage(&self) -> ExecutionStage {
        match self {
            ExecutionError::BuildFailed(_) => ExecutionStage::Build,
            ExecutionError::SigningFailed(_) => ExecutionStage::Sign,
            ExecutionError::SubmissionFailed(_) => ExecutionStage::Submit,
        }
    }
}
