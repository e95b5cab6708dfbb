//! Shared test utilities for collaborator testing
//!
//! Scripted stand-ins for the network collaborators so feeds, the
//! scheduler and the screeners can be exercised without sockets.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::{MarketDataClient, QuoteStream};
use crate::adapters::types::{Candle, Quote};

/// Build a quote with only a last price
pub fn quote_at(last: f64, timestamp_ms: u64) -> Quote {
    Quote {
        bid: Some(last - 0.01),
        ask: Some(last + 0.01),
        last: Some(last),
        timestamp_ms,
    }
}

/// Quote stream that replays a fixed script
///
/// Once the script is exhausted it either reports `StreamClosed`
/// or, with `hang_when_exhausted`, suspends forever (until cancelled).
pub struct ScriptedQuoteStream {
    pub name: &'static str,
    pub script: VecDeque<ExchangeResult<Quote>>,
    pub hang_when_exhausted: bool,
    /// Results handed out by `reconnect()`, `Ok(())` once empty
    pub reconnect_results: VecDeque<ExchangeResult<()>>,
    connected: bool,
    reconnect_count: usize,
}

impl ScriptedQuoteStream {
    pub fn new(name: &'static str, script: Vec<ExchangeResult<Quote>>) -> Self {
        Self {
            name,
            script: script.into(),
            hang_when_exhausted: false,
            reconnect_results: VecDeque::new(),
            connected: false,
            reconnect_count: 0,
        }
    }

    /// Suspend instead of failing once the script runs out
    pub fn hanging(mut self) -> Self {
        self.hang_when_exhausted = true;
        self
    }

    /// Queue results for successive `reconnect()` calls
    pub fn with_reconnect_results(mut self, results: Vec<ExchangeResult<()>>) -> Self {
        self.reconnect_results = results.into();
        self
    }

    pub fn reconnect_calls(&self) -> usize {
        self.reconnect_count
    }
}

#[async_trait]
impl QuoteStream for ScriptedQuoteStream {
    async fn connect(&mut self) -> ExchangeResult<()> {
        self.connected = true;
        Ok(())
    }

    async fn next_quote(&mut self, _symbol: &str) -> ExchangeResult<Quote> {
        self.connected = true;
        match self.script.pop_front() {
            Some(item) => {
                tokio::task::yield_now().await;
                item
            }
            None if self.hang_when_exhausted => std::future::pending().await,
            None => Err(ExchangeError::StreamClosed(self.name.to_string())),
        }
    }

    async fn reconnect(&mut self) -> ExchangeResult<()> {
        self.reconnect_count += 1;
        let result = self.reconnect_results.pop_front().unwrap_or(Ok(()));
        self.connected = result.is_ok();
        result
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn exchange_name(&self) -> &'static str {
        self.name
    }
}

/// In-memory REST collaborator
pub struct StaticMarketData {
    pub name: &'static str,
    pub markets: Vec<String>,
    pub funding: HashMap<String, f64>,
    pub candles: HashMap<String, Vec<Candle>>,
}

impl StaticMarketData {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            markets: Vec::new(),
            funding: HashMap::new(),
            candles: HashMap::new(),
        }
    }

    fn register(&mut self, symbol: &str) {
        if !self.markets.iter().any(|m| m == symbol) {
            self.markets.push(symbol.to_string());
        }
    }

    pub fn with_funding(mut self, symbol: &str, rate: f64) -> Self {
        self.register(symbol);
        self.funding.insert(symbol.to_string(), rate);
        self
    }

    /// Candles whose open/high/low/close all equal the given closes
    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.register(symbol);
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Candle {
                open_time_ms: i as u64 * 86_400_000,
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 1.0,
            })
            .collect();
        self.candles.insert(symbol.to_string(), candles);
        self
    }
}

fn unsupported(name: &str, symbol: &str) -> ExchangeError {
    ExchangeError::UnsupportedSymbol {
        exchange: name.to_string(),
        symbol: symbol.to_string(),
    }
}

#[async_trait]
impl MarketDataClient for StaticMarketData {
    async fn list_markets(&self) -> ExchangeResult<Vec<String>> {
        Ok(self.markets.clone())
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> ExchangeResult<f64> {
        self.funding
            .get(symbol)
            .copied()
            .ok_or_else(|| unsupported(self.name, symbol))
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        _timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        let candles = self
            .candles
            .get(symbol)
            .ok_or_else(|| unsupported(self.name, symbol))?;
        let skip = candles.len().saturating_sub(limit as usize);
        Ok(candles[skip..].to_vec())
    }

    fn exchange_name(&self) -> &'static str {
        self.name
    }
}
