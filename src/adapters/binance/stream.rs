//! Binance Quote Stream
//!
//! Pull-based ticker stream over the futures raw WebSocket endpoint.
//! Subscribes to `<symbol>@ticker` (last price) and `<symbol>@bookTicker`
//! (best bid/ask) and yields one `Quote` per ticker event.
//!
//! Binance sends protocol pings every few minutes; tungstenite answers them
//! while the stream is being read, so no heartbeat task is needed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::{connect_tls, TlsWebSocketStream};
use crate::adapters::traits::QuoteStream;
use crate::adapters::types::{parse_price_field, Quote};

use super::config::BinanceConfig;
use super::types::{to_binance_symbol, BinanceEvent, BinanceWsMessage, EXCHANGE_NAME};

/// Binance futures ticker stream implementing `QuoteStream`
pub struct BinanceStream {
    config: BinanceConfig,
    ws: Option<TlsWebSocketStream>,
    /// Native symbol currently subscribed (e.g. "ETHUSDT")
    subscribed: Option<String>,
    next_request_id: u64,
    best_bid: Option<f64>,
    best_ask: Option<f64>,
}

impl BinanceStream {
    pub fn new(config: BinanceConfig) -> Self {
        Self {
            config,
            ws: None,
            subscribed: None,
            next_request_id: 1,
            best_bid: None,
            best_ask: None,
        }
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    fn subscribe_message(native: &str, id: u64) -> String {
        let lower = native.to_lowercase();
        serde_json::json!({
            "method": "SUBSCRIBE",
            "params": [format!("{}@ticker", lower), format!("{}@bookTicker", lower)],
            "id": id,
        })
        .to_string()
    }

    async fn subscribe(&mut self, native: &str) -> ExchangeResult<()> {
        let id = self.next_request_id;
        self.next_request_id += 1;

        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| ExchangeError::ConnectionFailed("WebSocket not connected".into()))?;
        ws.send(Message::Text(Self::subscribe_message(native, id)))
            .await
            .map_err(|e| ExchangeError::WebSocket(Box::new(e)))?;

        self.subscribed = Some(native.to_string());
        self.best_bid = None;
        self.best_ask = None;

        tracing::info!(exchange = EXCHANGE_NAME, symbol = %native, request_id = id, "Subscribed to ticker streams");
        Ok(())
    }

    // =========================================================================
    // Message Handling
    // =========================================================================

    /// Apply one text frame; returns a quote when it completes a ticker update
    fn handle_text(&mut self, native: &str, text: &str) -> ExchangeResult<Option<Quote>> {
        match serde_json::from_str::<BinanceWsMessage>(text) {
            Ok(BinanceWsMessage::Event(BinanceEvent::Ticker { symbol, last, event_time }))
                if symbol == native =>
            {
                Ok(Some(Quote {
                    bid: self.best_bid,
                    ask: self.best_ask,
                    last: parse_price_field("last", &last),
                    timestamp_ms: event_time,
                }))
            }
            Ok(BinanceWsMessage::Event(BinanceEvent::BookTicker { symbol, bid, ask }))
                if symbol == native =>
            {
                self.best_bid = parse_price_field("bid", &bid);
                self.best_ask = parse_price_field("ask", &ask);
                Ok(None)
            }
            Ok(BinanceWsMessage::Event(_)) => Ok(None),
            Ok(BinanceWsMessage::Response { error: Some(err), .. }) => {
                Err(ExchangeError::SubscriptionFailed {
                    symbol: native.to_string(),
                    reason: format!("{} (code {})", err.msg, err.code),
                })
            }
            Ok(BinanceWsMessage::Response { id, error: None }) => {
                tracing::debug!(exchange = EXCHANGE_NAME, request_id = id, "Subscription confirmed");
                Ok(None)
            }
            Err(_) => {
                tracing::trace!(exchange = EXCHANGE_NAME, message = %text, "Unknown message format");
                Ok(None)
            }
        }
    }

    async fn read_until_ticker(&mut self, native: &str) -> ExchangeResult<Quote> {
        loop {
            let ws = self
                .ws
                .as_mut()
                .ok_or_else(|| ExchangeError::ConnectionFailed("WebSocket not connected".into()))?;

            let frame = match ws.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    self.ws = None;
                    return Err(ExchangeError::WebSocket(Box::new(e)));
                }
                None => {
                    self.ws = None;
                    return Err(ExchangeError::StreamClosed(EXCHANGE_NAME.to_string()));
                }
            };

            let text = match frame {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => {
                    tracing::info!(exchange = EXCHANGE_NAME, "WebSocket closed by server");
                    self.ws = None;
                    return Err(ExchangeError::StreamClosed(EXCHANGE_NAME.to_string()));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            if let Some(quote) = self.handle_text(native, &text)? {
                return Ok(quote);
            }
        }
    }
}

// =============================================================================
// QuoteStream Implementation
// =============================================================================

#[async_trait]
impl QuoteStream for BinanceStream {
    async fn connect(&mut self) -> ExchangeResult<()> {
        tracing::info!(exchange = EXCHANGE_NAME, url = %self.config.ws_url, "Connecting WebSocket");
        self.ws = Some(connect_tls(&self.config.ws_url).await?);
        Ok(())
    }

    async fn next_quote(&mut self, symbol: &str) -> ExchangeResult<Quote> {
        let native = to_binance_symbol(symbol)?;

        if self.ws.is_none() {
            self.connect().await?;
            self.subscribed = None;
        }
        if self.subscribed.as_deref() != Some(native.as_str()) {
            self.subscribe(&native).await?;
        }

        self.read_until_ticker(&native).await
    }

    async fn reconnect(&mut self) -> ExchangeResult<()> {
        let restore = self.subscribed.clone();
        self.disconnect().await?;
        self.connect().await?;
        if let Some(native) = restore {
            self.subscribe(&native).await?;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
        }
        self.subscribed = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }

    fn exchange_name(&self) -> &'static str {
        EXCHANGE_NAME
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> BinanceStream {
        BinanceStream::new(BinanceConfig::default())
    }

    #[test]
    fn test_stream_not_connected_initially() {
        let s = stream();
        assert!(!s.is_connected());
        assert_eq!(s.exchange_name(), "binance");
    }

    #[test]
    fn test_subscribe_message_format() {
        let msg: serde_json::Value =
            serde_json::from_str(&BinanceStream::subscribe_message("ETHUSDT", 7)).unwrap();
        assert_eq!(msg["method"], "SUBSCRIBE");
        assert_eq!(msg["params"][0], "ethusdt@ticker");
        assert_eq!(msg["params"][1], "ethusdt@bookTicker");
        assert_eq!(msg["id"], 7);
    }

    #[test]
    fn test_book_ticker_then_ticker_yields_quote() {
        let mut s = stream();
        let book = r#"{"e":"bookTicker","s":"ETHUSDT","b":"3499.9","a":"3500.1"}"#;
        assert!(s.handle_text("ETHUSDT", book).unwrap().is_none());

        let ticker = r#"{"e":"24hrTicker","E":1700000000000,"s":"ETHUSDT","c":"3500.0"}"#;
        let quote = s.handle_text("ETHUSDT", ticker).unwrap().unwrap();
        assert_eq!(quote.last, Some(3500.0));
        assert_eq!(quote.bid, Some(3499.9));
        assert_eq!(quote.ask, Some(3500.1));
        assert_eq!(quote.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_other_symbol_ignored() {
        let mut s = stream();
        let ticker = r#"{"e":"24hrTicker","E":1,"s":"BTCUSDT","c":"60000"}"#;
        assert!(s.handle_text("ETHUSDT", ticker).unwrap().is_none());
    }

    #[test]
    fn test_subscription_error_surfaces() {
        let mut s = stream();
        let reply = r#"{"error":{"code":2,"msg":"Invalid request"},"id":1}"#;
        let err = s.handle_text("ETHUSDT", reply).unwrap_err();
        assert!(matches!(err, ExchangeError::SubscriptionFailed { .. }));
    }

    #[test]
    fn test_garbage_ignored() {
        let mut s = stream();
        assert!(s.handle_text("ETHUSDT", "not json").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_quote_rejects_malformed_symbol_before_connecting() {
        let mut s = stream();
        assert!(s.next_quote("ETHUSDT").await.is_err());
        assert!(!s.is_connected());
    }
}
