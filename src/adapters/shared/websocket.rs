//! Public market-data WebSocket connector
//!
//! Both ticker streams (Binance fstream, OKX v5 public) are unauthenticated,
//! so a plain URL connect over native-tls is all they need.

use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};

use crate::adapters::errors::ExchangeError;

pub type TlsWebSocketStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

fn tls_connector() -> Result<Connector, ExchangeError> {
    native_tls::TlsConnector::builder()
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map(Connector::NativeTls)
        .map_err(|e| ExchangeError::ConnectionFailed(format!("TLS setup failed: {}", e)))
}

/// Open a ticker socket at `url` (TLS 1.2 minimum)
///
/// The HTTP upgrade response is discarded; venue streams only read frames.
pub async fn connect_tls(url: &str) -> Result<TlsWebSocketStream, ExchangeError> {
    let (ws, _) = connect_async_tls_with_config(url, None, false, Some(tls_connector()?))
        .await
        .map_err(|e| ExchangeError::WebSocket(Box::new(e)))?;
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_connector_builds() {
        assert!(matches!(tls_connector(), Ok(Connector::NativeTls(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_websocket_error() {
        match connect_tls("ws://127.0.0.1:1/stream").await {
            Err(ExchangeError::WebSocket(_)) => {}
            Err(other) => panic!("Expected WebSocket error, got {:?}", other),
            Ok(_) => panic!("Expected connection failure"),
        }
    }
}
