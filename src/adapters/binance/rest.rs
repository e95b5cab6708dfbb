//! Binance REST Market Data
//!
//! Public futures endpoints used by the screeners: listed perpetuals,
//! funding rates and klines. No authentication.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::MarketDataClient;
use crate::adapters::types::{create_http_client, parse_price_field, Candle};

use super::config::BinanceConfig;
use super::types::{
    parse_kline, to_binance_symbol, BinanceApiError, ExchangeInfo, PremiumIndex, EXCHANGE_NAME,
    INVALID_SYMBOL_CODE,
};

/// Binance futures REST client implementing `MarketDataClient`
pub struct BinanceRest {
    config: BinanceConfig,
    http_client: reqwest::Client,
}

impl BinanceRest {
    pub fn new(config: BinanceConfig) -> Self {
        Self {
            config,
            http_client: create_http_client(EXCHANGE_NAME),
        }
    }

    /// GET `path` with `query` and decode the JSON body
    ///
    /// `symbol` (unified) is only used to build `UnsupportedSymbol` errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        symbol: Option<&str>,
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.config.rest_url, path);
        tracing::debug!(exchange = EXCHANGE_NAME, url = %url, "REST GET");

        let response = self.http_client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ExchangeError::InvalidResponse(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            if let Ok(api_err) = serde_json::from_str::<BinanceApiError>(&text) {
                if api_err.code == INVALID_SYMBOL_CODE {
                    if let Some(symbol) = symbol {
                        return Err(ExchangeError::UnsupportedSymbol {
                            exchange: EXCHANGE_NAME.to_string(),
                            symbol: symbol.to_string(),
                        });
                    }
                }
                return Err(ExchangeError::Http(format!(
                    "{} failed ({}): {} (code {})",
                    path, status, api_err.msg, api_err.code
                )));
            }
            return Err(ExchangeError::Http(format!("{} failed ({}): {}", path, status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid JSON: {} - {}", e, text)))
    }
}

#[async_trait]
impl MarketDataClient for BinanceRest {
    async fn list_markets(&self) -> ExchangeResult<Vec<String>> {
        let info: ExchangeInfo = self.get_json("/fapi/v1/exchangeInfo", &[], None).await?;
        let markets: Vec<String> = info
            .symbols
            .iter()
            .filter_map(|s| s.unified_perpetual())
            .collect();

        tracing::debug!(exchange = EXCHANGE_NAME, count = markets.len(), "Listed perpetual markets");
        Ok(markets)
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> ExchangeResult<f64> {
        let native = to_binance_symbol(symbol)?;
        let index: PremiumIndex = self
            .get_json("/fapi/v1/premiumIndex", &[("symbol", native)], Some(symbol))
            .await?;

        parse_price_field("lastFundingRate", &index.last_funding_rate).ok_or_else(|| {
            ExchangeError::InvalidResponse(format!(
                "Binance {}: bad funding rate '{}'",
                index.symbol, index.last_funding_rate
            ))
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        let native = to_binance_symbol(symbol)?;
        let rows: Vec<Vec<serde_json::Value>> = self
            .get_json(
                "/fapi/v1/klines",
                &[
                    ("symbol", native),
                    ("interval", timeframe.to_string()),
                    ("limit", limit.to_string()),
                ],
                Some(symbol),
            )
            .await?;

        // Binance returns klines oldest first
        rows.iter().map(|row| parse_kline(row)).collect()
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
    use mockito::Matcher;

    async fn client_for(server: &mockito::ServerGuard) -> BinanceRest {
        BinanceRest::new(BinanceConfig::with_rest_url(server.url()))
    }

    #[tokio::test]
    async fn test_list_markets_keeps_live_perpetuals() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"timezone":"UTC","symbols":[
                    {"symbol":"ETHUSDT","status":"TRADING","contractType":"PERPETUAL","baseAsset":"ETH","quoteAsset":"USDT","marginAsset":"USDT"},
                    {"symbol":"ETHUSDT_250328","status":"TRADING","contractType":"CURRENT_QUARTER","baseAsset":"ETH","quoteAsset":"USDT","marginAsset":"USDT"},
                    {"symbol":"WLDUSDT","status":"TRADING","contractType":"PERPETUAL","baseAsset":"WLD","quoteAsset":"USDT","marginAsset":"USDT"}
                ]}"#,
            )
            .create_async()
            .await;

        let markets = client_for(&server).await.list_markets().await.unwrap();
        assert_eq!(markets, vec!["ETH/USDT:USDT", "WLD/USDT:USDT"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_funding_rate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fapi/v1/premiumIndex")
            .match_query(Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()))
            .with_status(200)
            .with_body(r#"{"symbol":"ETHUSDT","markPrice":"3500.0","lastFundingRate":"0.00010000","time":1}"#)
            .create_async()
            .await;

        let rate = client_for(&server)
            .await
            .fetch_funding_rate("ETH/USDT:USDT")
            .await
            .unwrap();
        assert!((rate - 0.0001).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_invalid_symbol_maps_to_unsupported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fapi/v1/premiumIndex")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .await
            .fetch_funding_rate("NOPE/USDT:USDT")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ExchangeError::UnsupportedSymbol { ref symbol, .. } if symbol == "NOPE/USDT:USDT"),
            "Got: {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_server_error_maps_to_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server).await.list_markets().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_ohlcv() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fapi/v1/klines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()),
                Matcher::UrlEncoded("interval".into(), "1d".into()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[[1700000000000,"100.0","110.0","95.0","105.0","10.0",1700086399999,"0",1,"0","0","0"],
                    [1700086400000,"105.0","120.0","104.0","118.0","12.0",1700172799999,"0",1,"0","0","0"]]"#,
            )
            .create_async()
            .await;

        let candles = client_for(&server)
            .await
            .fetch_ohlcv("ETH/USDT:USDT", "1d", 2)
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[1].close, 118.0);
        assert!(candles[0].open_time_ms < candles[1].open_time_ms);
    }
}
