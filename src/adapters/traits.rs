//! Exchange collaborator trait definitions
//!
//! Two seams separate the core from the network:
//! - `QuoteStream`: live ticker stream, one quote per call (WebSocket)
//! - `MarketDataClient`: request/response market metadata (REST)
//!
//! The price feeds only ever see a `QuoteStream`, so tests drive them with
//! scripted streams instead of sockets.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::types::{Candle, Quote};

/// Streaming ticker collaborator
///
/// # Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl QuoteStream for OkxStream {
///     async fn next_quote(&mut self, symbol: &str) -> ExchangeResult<Quote> {
///         self.ensure_subscribed(symbol).await?;
///         self.read_until_ticker().await
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait QuoteStream: Send {
    /// Open the WebSocket connection (no subscription yet)
    async fn connect(&mut self) -> ExchangeResult<()>;

    /// Wait for the next ticker update of `symbol`
    ///
    /// `symbol` is the unified form (e.g. "ETH/USDT:USDT"). The first call
    /// connects and subscribes if needed; later calls suspend until the
    /// venue pushes a new ticker. Any error is transient from the caller's
    /// point of view.
    async fn next_quote(&mut self, symbol: &str) -> ExchangeResult<Quote>;

    /// Tear down and re-establish the connection, restoring subscriptions
    async fn reconnect(&mut self) -> ExchangeResult<()>;

    /// Gracefully close the connection
    async fn disconnect(&mut self) -> ExchangeResult<()>;

    /// Check if the stream currently holds an open connection
    fn is_connected(&self) -> bool;

    /// Get the exchange name identifier (e.g. "binance", "okx")
    fn exchange_name(&self) -> &'static str;
}

/// Request/response market data collaborator used by the screeners
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// List every perpetual market of the venue, in unified symbol form
    async fn list_markets(&self) -> ExchangeResult<Vec<String>>;

    /// Current (or last settled) funding rate of `symbol`
    async fn fetch_funding_rate(&self, symbol: &str) -> ExchangeResult<f64>;

    /// Last `limit` candles of `symbol` at `timeframe` (e.g. "1d", "1h"), oldest first
    async fn fetch_ohlcv(&self, symbol: &str, timeframe: &str, limit: u32)
        -> ExchangeResult<Vec<Candle>>;

    /// Get the exchange name identifier
    fn exchange_name(&self) -> &'static str;
}
