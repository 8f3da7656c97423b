mod executor;
mod types;
mod error;

pub use executor::TradeExecutor;
pub use types::ExecutionOutcome;
pub use error::{ExecutionError, ExecutionStage};
