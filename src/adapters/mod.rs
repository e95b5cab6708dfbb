//! Exchange collaborators for Binance and OKX
//!
//! This module provides the abstractions the core uses to reach the
//! venues: a streaming `QuoteStream` for the price feeds and a REST
//! `MarketDataClient` for the screeners.

pub mod binance;
pub mod errors;
pub mod factory;
pub mod okx;
pub mod shared;
pub mod symbol;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use errors::{ExchangeError, ExchangeResult};
pub use factory::{
    create_market_data, create_quote_stream, resolve_symbol, AnyMarketData, AnyQuoteStream,
    Exchange,
};
pub use symbol::UnifiedSymbol;
pub use traits::{MarketDataClient, QuoteStream};
pub use types::{Candle, Quote};
