//! Core data types for exchange collaborators
//!
//! These types are shared by every venue client so the feeds and the
//! screeners never see venue-specific payloads.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// HTTP Client Constants
// =============================================================================

/// HTTP request timeout (seconds)
const HTTP_TIMEOUT_SECS: u64 = 10;
/// HTTP connection timeout (milliseconds)
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3000;
/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 5;
/// How long idle connections stay in the pool (seconds)
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 60;
/// TCP keepalive interval (seconds)
const HTTP_TCP_KEEPALIVE_SECS: u64 = 30;

/// Create the pooled HTTP client used by the REST collaborators
pub fn create_http_client(exchange_name: &str) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .tcp_keepalive(Duration::from_secs(HTTP_TCP_KEEPALIVE_SECS))
        .connect_timeout(Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
    tracing::debug!(
        phase = "init",
        exchange = %exchange_name,
        timeout_s = HTTP_TIMEOUT_SECS,
        connect_timeout_ms = HTTP_CONNECT_TIMEOUT_MS,
        "HTTP client configured"
    );
    client
}

/// WebSocket application-level ping interval (seconds)
pub const WS_PING_INTERVAL_SECS: u64 = 20;

/// Parse a decimal string field from an exchange payload
pub(crate) fn parse_price_field(field: &str, raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(field = field, raw = raw, "Unparseable numeric field");
            None
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// One ticker update from a streaming venue
///
/// Any of the three prices may be absent when the venue has not published
/// it yet (e.g. a freshly listed market without trades).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid
    pub bid: Option<f64>,
    /// Best ask
    pub ask: Option<f64>,
    /// Last traded price
    pub last: Option<f64>,
    /// Exchange timestamp (Unix ms)
    pub timestamp_ms: u64,
}

impl Quote {
    /// Last traded price if it is usable as a sample (finite and > 0)
    #[inline]
    pub fn tradable_last(&self) -> Option<f64> {
        self.last.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Midpoint of bid/ask when both sides are present
    #[inline]
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((a + b) / 2.0),
            _ => None,
        }
    }
}

// =============================================================================
// Candle
// =============================================================================

/// OHLCV candle returned by the REST collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time (Unix ms)
    pub open_time_ms: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(last: Option<f64>) -> Quote {
        Quote {
            bid: Some(99.9),
            ask: Some(100.1),
            last,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_tradable_last_accepts_positive() {
        assert_eq!(quote(Some(100.0)).tradable_last(), Some(100.0));
    }

    #[test]
    fn test_tradable_last_rejects_zero_negative_nan() {
        assert_eq!(quote(Some(0.0)).tradable_last(), None);
        assert_eq!(quote(Some(-1.0)).tradable_last(), None);
        assert_eq!(quote(Some(f64::NAN)).tradable_last(), None);
        assert_eq!(quote(None).tradable_last(), None);
    }

    #[test]
    fn test_mid() {
        let q = quote(Some(100.0));
        assert!((q.mid().unwrap() - 100.0).abs() < 1e-9);

        let one_sided = Quote { ask: None, ..q };
        assert_eq!(one_sided.mid(), None);
    }

    #[test]
    fn test_parse_price_field() {
        assert_eq!(parse_price_field("last", "3500.25"), Some(3500.25));
        assert_eq!(parse_price_field("last", ""), None);
        assert_eq!(parse_price_field("last", "abc"), None);
    }
}
