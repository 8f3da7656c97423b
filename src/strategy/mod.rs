mod filter;
mod types;

pub use filter::CopyStrategy;
pub use types::{
    SizingMode,
    StrategyConfig,
};
