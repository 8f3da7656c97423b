pub mod jupiter;
mod router;
mod types;

pub use jupiter::{JupiterRouter, JUPITER_API_URL};
pub use router::{RouteError, SwapRouter};
#[cfg(test)]
pub use router::MockSwapRouter;
pub use types::{QuoteRequest, SwapQuote};
