//! Exchange collaborator error types
//!
//! Every failure coming out of a venue client (WebSocket stream or REST)
//! is an `ExchangeError`. For the price feeds these are transient: the
//! feed that sees one stops (or retries, if configured) without touching
//! the rest of the process.

use thiserror::Error;

/// Exchange-specific error types for collaborator operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection to exchange failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Subscription to market data failed
    #[error("Subscription failed for {symbol}: {reason}")]
    SubscriptionFailed { symbol: String, reason: String },

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected response from exchange
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Server closed the stream (close frame or end of stream)
    #[error("Stream closed by {0}")]
    StreamClosed(String),

    /// Instrument is not listed on this venue
    #[error("Symbol {symbol} not available on {exchange}")]
    UnsupportedSymbol { exchange: String, symbol: String },

    /// REST transport or status error
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Http(format!("request timed out: {}", err))
        } else {
            ExchangeError::Http(err.to_string())
        }
    }
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
