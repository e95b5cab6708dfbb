//! Collaborator factory for runtime venue selection
//!
//! Creates quote streams and REST clients from an `Exchange` value.
//! Uses an enum-based dispatch pattern (no `Box<dyn>`) so the feeds stay
//! generic over a concrete `QuoteStream`.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::binance::{types::to_binance_symbol, BinanceConfig, BinanceRest, BinanceStream};
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::okx::{types::to_okx_symbol, OkxConfig, OkxRest, OkxStream};
use crate::adapters::traits::{MarketDataClient, QuoteStream};
use crate::adapters::types::{Candle, Quote};

// =============================================================================
// Exchange
// =============================================================================

/// Supported venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Okx,
}

/// All supported exchange names
pub const SUPPORTED_EXCHANGES: &[&str] = &["binance", "okx"];

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Binance, Exchange::Okx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Okx => "okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "okx" => Ok(Exchange::Okx),
            _ => Err(ExchangeError::ConnectionFailed(format!(
                "Unknown exchange: '{}'. Supported: {}",
                s,
                SUPPORTED_EXCHANGES.join(", ")
            ))),
        }
    }
}

// =============================================================================
// AnyQuoteStream / AnyMarketData
// =============================================================================

/// Enum wrapping all concrete quote streams for runtime dispatch
pub enum AnyQuoteStream {
    Binance(BinanceStream),
    Okx(OkxStream),
}

/// Enum wrapping all concrete REST clients for runtime dispatch
pub enum AnyMarketData {
    Binance(BinanceRest),
    Okx(OkxRest),
}

/// Macro to reduce boilerplate for delegating trait methods
macro_rules! delegate {
    ($ty:ident, $self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            $ty::Binance(a) => a.$method($($arg),*),
            $ty::Okx(a) => a.$method($($arg),*),
        }
    };
    (await $ty:ident, $self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            $ty::Binance(a) => a.$method($($arg),*).await,
            $ty::Okx(a) => a.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl QuoteStream for AnyQuoteStream {
    async fn connect(&mut self) -> ExchangeResult<()> {
        delegate!(await AnyQuoteStream, self, connect())
    }

    async fn next_quote(&mut self, symbol: &str) -> ExchangeResult<Quote> {
        delegate!(await AnyQuoteStream, self, next_quote(symbol))
    }

    async fn reconnect(&mut self) -> ExchangeResult<()> {
        delegate!(await AnyQuoteStream, self, reconnect())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        delegate!(await AnyQuoteStream, self, disconnect())
    }

    fn is_connected(&self) -> bool {
        delegate!(AnyQuoteStream, self, is_connected())
    }

    fn exchange_name(&self) -> &'static str {
        delegate!(AnyQuoteStream, self, exchange_name())
    }
}

#[async_trait]
impl MarketDataClient for AnyMarketData {
    async fn list_markets(&self) -> ExchangeResult<Vec<String>> {
        delegate!(await AnyMarketData, self, list_markets())
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> ExchangeResult<f64> {
        delegate!(await AnyMarketData, self, fetch_funding_rate(symbol))
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        delegate!(await AnyMarketData, self, fetch_ohlcv(symbol, timeframe, limit))
    }

    fn exchange_name(&self) -> &'static str {
        delegate!(AnyMarketData, self, exchange_name())
    }
}

// =============================================================================
// Factory Functions
// =============================================================================

/// Create a quote stream for `exchange` (endpoints from env)
///
/// The stream is created but NOT connected; the first `next_quote()` connects.
pub fn create_quote_stream(exchange: Exchange) -> AnyQuoteStream {
    match exchange {
        Exchange::Binance => AnyQuoteStream::Binance(BinanceStream::new(BinanceConfig::from_env())),
        Exchange::Okx => AnyQuoteStream::Okx(OkxStream::new(OkxConfig::from_env())),
    }
}

/// Create a REST market data client for `exchange` (endpoints from env)
pub fn create_market_data(exchange: Exchange) -> AnyMarketData {
    match exchange {
        Exchange::Binance => AnyMarketData::Binance(BinanceRest::new(BinanceConfig::from_env())),
        Exchange::Okx => AnyMarketData::Okx(OkxRest::new(OkxConfig::from_env())),
    }
}

/// Native instrument id of a unified symbol on `exchange`
pub fn resolve_symbol(exchange: Exchange, unified: &str) -> ExchangeResult<String> {
    match exchange {
        Exchange::Binance => to_binance_symbol(unified),
        Exchange::Okx => to_okx_symbol(unified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_from_str() {
        assert_eq!("binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!("OKX".parse::<Exchange>().unwrap(), Exchange::Okx);
        let err = "bybit".parse::<Exchange>().unwrap_err();
        assert!(err.to_string().contains("binance, okx"));
    }

    #[test]
    fn test_exchange_serde_lowercase() {
        let ex: Exchange = serde_yaml::from_str("okx").unwrap();
        assert_eq!(ex, Exchange::Okx);
        assert_eq!(serde_json::to_string(&Exchange::Binance).unwrap(), "\"binance\"");
    }

    #[test]
    fn test_resolve_symbol() {
        assert_eq!(resolve_symbol(Exchange::Binance, "ETH/USDT:USDT").unwrap(), "ETHUSDT");
        assert_eq!(resolve_symbol(Exchange::Okx, "ETH/USDT:USDT").unwrap(), "ETH-USDT-SWAP");
        assert!(resolve_symbol(Exchange::Okx, "garbage").is_err());
    }

    #[test]
    fn test_create_collaborators_match_exchange() {
        for exchange in Exchange::ALL {
            assert_eq!(create_quote_stream(exchange).exchange_name(), exchange.as_str());
            assert_eq!(create_market_data(exchange).exchange_name(), exchange.as_str());
        }
    }

    #[test]
    fn test_created_stream_not_connected() {
        assert!(!create_quote_stream(Exchange::Binance).is_connected());
    }
}
