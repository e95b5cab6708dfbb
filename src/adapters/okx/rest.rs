//! OKX REST Market Data
//!
//! Public v5 endpoints used by the screeners. Every response carries a
//! `{"code","msg","data"}` envelope; a non-"0" code is an error even when
//! the HTTP status is 200.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::MarketDataClient;
use crate::adapters::types::{create_http_client, parse_price_field, Candle};

use super::config::OkxConfig;
use super::types::{
    parse_candle, to_okx_bar, to_okx_symbol, OkxFundingRate, OkxInstrument, OkxResponse,
    EXCHANGE_NAME, INSTRUMENT_NOT_FOUND_CODE,
};

/// OKX REST client implementing `MarketDataClient`
pub struct OkxRest {
    config: OkxConfig,
    http_client: reqwest::Client,
}

impl OkxRest {
    pub fn new(config: OkxConfig) -> Self {
        Self {
            config,
            http_client: create_http_client(EXCHANGE_NAME),
        }
    }

    /// GET `path` and unwrap the `data` array of the envelope
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        symbol: Option<&str>,
    ) -> ExchangeResult<Vec<T>> {
        let url = format!("{}{}", self.config.rest_url, path);
        tracing::debug!(exchange = EXCHANGE_NAME, url = %url, "REST GET");

        let response = self.http_client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ExchangeError::InvalidResponse(format!("Failed to read response: {}", e))
        })?;

        let envelope: OkxResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ExchangeError::Http(format!("{} failed ({}): {}", path, status, text)));
            }
            Err(e) => {
                return Err(ExchangeError::InvalidResponse(format!(
                    "Invalid JSON: {} - {}",
                    e, text
                )));
            }
        };

        if envelope.code != "0" {
            if envelope.code == INSTRUMENT_NOT_FOUND_CODE {
                if let Some(symbol) = symbol {
                    return Err(ExchangeError::UnsupportedSymbol {
                        exchange: EXCHANGE_NAME.to_string(),
                        symbol: symbol.to_string(),
                    });
                }
            }
            return Err(ExchangeError::Http(format!(
                "{} failed ({}): {} (code {})",
                path, status, envelope.msg, envelope.code
            )));
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl MarketDataClient for OkxRest {
    async fn list_markets(&self) -> ExchangeResult<Vec<String>> {
        let instruments: Vec<OkxInstrument> = self
            .get_data(
                "/api/v5/public/instruments",
                &[("instType", "SWAP".to_string())],
                None,
            )
            .await?;

        let markets: Vec<String> = instruments
            .iter()
            .filter_map(|inst| {
                let unified = inst.unified();
                if unified.is_none() {
                    tracing::trace!(exchange = EXCHANGE_NAME, inst_id = %inst.inst_id, "Skipping instrument");
                }
                unified
            })
            .collect();

        tracing::debug!(exchange = EXCHANGE_NAME, count = markets.len(), "Listed swap markets");
        Ok(markets)
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> ExchangeResult<f64> {
        let inst_id = to_okx_symbol(symbol)?;
        let rates: Vec<OkxFundingRate> = self
            .get_data(
                "/api/v5/public/funding-rate",
                &[("instId", inst_id.clone())],
                Some(symbol),
            )
            .await?;

        let rate = rates.first().ok_or_else(|| {
            ExchangeError::InvalidResponse(format!("OKX {}: empty funding-rate data", inst_id))
        })?;
        parse_price_field("fundingRate", &rate.funding_rate).ok_or_else(|| {
            ExchangeError::InvalidResponse(format!(
                "OKX {}: bad funding rate '{}'",
                rate.inst_id, rate.funding_rate
            ))
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        let inst_id = to_okx_symbol(symbol)?;
        let rows: Vec<Vec<String>> = self
            .get_data(
                "/api/v5/market/candles",
                &[
                    ("instId", inst_id),
                    ("bar", to_okx_bar(timeframe)),
                    ("limit", limit.to_string()),
                ],
                Some(symbol),
            )
            .await?;

        // OKX returns candles newest first
        let mut candles = rows
            .iter()
            .map(|row| parse_candle(row))
            .collect::<ExchangeResult<Vec<_>>>()?;
        candles.reverse();
        Ok(candles)
    }

    fn exchange_name(&self) -> &'static str {
        EXCHANGE_NAME
    }
}

// =============================================================================
// Tests
// =============================================================================
