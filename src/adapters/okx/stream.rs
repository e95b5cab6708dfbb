//! OKX Quote Stream
//!
//! Pull-based ticker stream over the v5 public WebSocket `tickers` channel.
//! OKX closes connections that stay silent for 30s, so when no frame
//! arrives within `ping_after_idle` a text "ping" is sent and the "pong"
//! reply is swallowed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::{connect_tls, TlsWebSocketStream};
use crate::adapters::traits::QuoteStream;
use crate::adapters::types::Quote;

use super::config::OkxConfig;
use super::types::{to_okx_symbol, OkxWsMessage, EXCHANGE_NAME};

/// OKX swap ticker stream implementing `QuoteStream`
pub struct OkxStream {
    config: OkxConfig,
    ws: Option<TlsWebSocketStream>,
    /// Native instrument currently subscribed (e.g. "ETH-USDT-SWAP")
    subscribed: Option<String>,
}

impl OkxStream {
    pub fn new(config: OkxConfig) -> Self {
        Self {
            config,
            ws: None,
            subscribed: None,
        }
    }

    fn subscribe_message(inst_id: &str) -> String {
        serde_json::json!({
            "op": "subscribe",
            "args": [{"channel": "tickers", "instId": inst_id}],
        })
        .to_string()
    }

    async fn send_text(&mut self, text: String) -> ExchangeResult<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| ExchangeError::ConnectionFailed("WebSocket not connected".into()))?;
        ws.send(Message::Text(text))
            .await
            .map_err(|e| ExchangeError::WebSocket(Box::new(e)))
    }

    async fn subscribe(&mut self, inst_id: &str) -> ExchangeResult<()> {
        self.send_text(Self::subscribe_message(inst_id)).await?;
        self.subscribed = Some(inst_id.to_string());
        tracing::info!(exchange = EXCHANGE_NAME, symbol = %inst_id, "Subscribed to tickers channel");
        Ok(())
    }

    /// Apply one text frame; returns the quote carried by a matching push
    fn handle_text(inst_id: &str, text: &str) -> ExchangeResult<Option<Quote>> {
        if text == "pong" {
            tracing::trace!(exchange = EXCHANGE_NAME, "PONG received");
            return Ok(None);
        }

        match serde_json::from_str::<OkxWsMessage>(text) {
            Ok(OkxWsMessage::Push { arg, data }) => {
                if arg.channel != "tickers" || arg.inst_id.as_deref() != Some(inst_id) {
                    return Ok(None);
                }
                // A push may batch several updates; the newest is last
                Ok(data
                    .iter()
                    .rev()
                    .find(|t| t.inst_id == inst_id)
                    .map(|t| t.to_quote()))
            }
            Ok(OkxWsMessage::Event { event, code, msg }) if event == "error" => {
                Err(ExchangeError::SubscriptionFailed {
                    symbol: inst_id.to_string(),
                    reason: format!(
                        "{} (code {})",
                        msg.unwrap_or_default(),
                        code.unwrap_or_default()
                    ),
                })
            }
            Ok(OkxWsMessage::Event { event, .. }) => {
                tracing::debug!(exchange = EXCHANGE_NAME, event = %event, "Event received");
                Ok(None)
            }
            Err(_) => {
                tracing::trace!(exchange = EXCHANGE_NAME, message = %text, "Unknown message format");
                Ok(None)
            }
        }
    }

    async fn read_until_ticker(&mut self, inst_id: &str) -> ExchangeResult<Quote> {
        loop {
            let idle = self.config.ping_after_idle;
            let ws = self
                .ws
                .as_mut()
                .ok_or_else(|| ExchangeError::ConnectionFailed("WebSocket not connected".into()))?;

            let frame = match tokio::time::timeout(idle, ws.next()).await {
                Err(_) => {
                    tracing::trace!(exchange = EXCHANGE_NAME, "Idle, sending ping");
                    self.send_text("ping".to_string()).await?;
                    continue;
                }
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(e))) => {
                    self.ws = None;
                    return Err(ExchangeError::WebSocket(Box::new(e)));
                }
                Ok(None) => {
                    self.ws = None;
                    return Err(ExchangeError::StreamClosed(EXCHANGE_NAME.to_string()));
                }
            };

            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => {
                    tracing::info!(exchange = EXCHANGE_NAME, "WebSocket closed by server");
                    self.ws = None;
                    return Err(ExchangeError::StreamClosed(EXCHANGE_NAME.to_string()));
                }
                _ => continue,
            };

            if let Some(quote) = Self::handle_text(inst_id, &text)? {
                return Ok(quote);
            }
        }
    }
}

// =============================================================================
// QuoteStream Implementation
// =============================================================================

#[async_trait]
impl QuoteStream for OkxStream {
    async fn connect(&mut self) -> ExchangeResult<()> {
        tracing::info!(exchange = EXCHANGE_NAME, url = %self.config.ws_url, "Connecting WebSocket");
        self.ws = Some(connect_tls(&self.config.ws_url).await?);
        Ok(())
    }

    async fn next_quote(&mut self, symbol: &str) -> ExchangeResult<Quote> {
        let inst_id = to_okx_symbol(symbol)?;

        if self.ws.is_none() {
            self.connect().await?;
            self.subscribed = None;
        }
        if self.subscribed.as_deref() != Some(inst_id.as_str()) {
            self.subscribe(&inst_id).await?;
        }

        self.read_until_ticker(&inst_id).await
    }

    async fn reconnect(&mut self) -> ExchangeResult<()> {
        let restore = self.subscribed.clone();
        self.disconnect().await?;
        self.connect().await?;
        if let Some(inst_id) = restore {
            self.subscribe(&inst_id).await?;
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

    const INST: &str = "ETH-USDT-SWAP";

    #[test]
    fn test_stream_not_connected_initially() {
        let s = OkxStream::new(OkxConfig::default());
        assert!(!s.is_connected());
        assert_eq!(s.exchange_name(), "okx");
    }

    #[test]
    fn test_subscribe_message_format() {
        let msg: serde_json::Value =
            serde_json::from_str(&OkxStream::subscribe_message(INST)).unwrap();
        assert_eq!(msg["op"], "subscribe");
        assert_eq!(msg["args"][0]["channel"], "tickers");
        assert_eq!(msg["args"][0]["instId"], INST);
    }

    #[test]
    fn test_push_yields_latest_quote() {
        let push = r#"{"arg":{"channel":"tickers","instId":"ETH-USDT-SWAP"},"data":[
            {"instId":"ETH-USDT-SWAP","last":"3500.0","bidPx":"3499.9","askPx":"3500.1","ts":"1"},
            {"instId":"ETH-USDT-SWAP","last":"3501.0","bidPx":"3500.9","askPx":"3501.1","ts":"2"}]}"#;
        let quote = OkxStream::handle_text(INST, push).unwrap().unwrap();
        assert_eq!(quote.last, Some(3501.0));
        assert_eq!(quote.timestamp_ms, 2);
    }

    #[test]
    fn test_pong_and_ack_ignored() {
        assert!(OkxStream::handle_text(INST, "pong").unwrap().is_none());
        let ack = r#"{"event":"subscribe","arg":{"channel":"tickers","instId":"ETH-USDT-SWAP"}}"#;
        assert!(OkxStream::handle_text(INST, ack).unwrap().is_none());
    }

    #[test]
    fn test_other_instrument_ignored() {
        let push = r#"{"arg":{"channel":"tickers","instId":"BTC-USDT-SWAP"},"data":[
            {"instId":"BTC-USDT-SWAP","last":"60000","bidPx":"","askPx":"","ts":"1"}]}"#;
        assert!(OkxStream::handle_text(INST, push).unwrap().is_none());
    }

    #[test]
    fn test_error_event_surfaces() {
        let err = r#"{"event":"error","code":"60018","msg":"Wrong URL or channel"}"#;
        let result = OkxStream::handle_text(INST, err);
        assert!(matches!(result, Err(ExchangeError::SubscriptionFailed { .. })));
    }
}
