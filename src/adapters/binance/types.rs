//! Binance Types
//!
//! Payloads of the USDⓈ-M futures public API.
//!
//! WebSocket events (raw stream endpoint):
//!   `<symbol>@ticker`     -> `{"e":"24hrTicker","E":..,"s":"ETHUSDT","c":"3500.1",..}`
//!   `<symbol>@bookTicker` -> `{"e":"bookTicker","s":"ETHUSDT","b":"3500.0","a":"3500.2",..}`
//!
//! REST endpoints:
//!   `/fapi/v1/exchangeInfo`, `/fapi/v1/premiumIndex`, `/fapi/v1/klines`

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::symbol::UnifiedSymbol;
use crate::adapters::types::{parse_price_field, Candle};

pub(crate) const EXCHANGE_NAME: &str = "binance";

// =============================================================================
// Symbols
// =============================================================================

/// Convert a unified symbol to the Binance futures id (`ETH/USDT:USDT` -> `ETHUSDT`)
///
/// Only linear contracts (settled in the quote currency) are listed on USDⓈ-M.
pub fn to_binance_symbol(unified: &str) -> ExchangeResult<String> {
    let sym: UnifiedSymbol = unified.parse()?;
    if sym.settle != sym.quote {
        return Err(ExchangeError::UnsupportedSymbol {
            exchange: EXCHANGE_NAME.to_string(),
            symbol: unified.to_string(),
        });
    }
    Ok(format!("{}{}", sym.base, sym.quote))
}

// =============================================================================
// WebSocket Message Types
// =============================================================================

/// Market data event pushed on a subscribed stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "e")]
pub(crate) enum BinanceEvent {
    /// Rolling 24h ticker, carries the last traded price
    #[serde(rename = "24hrTicker")]
    Ticker {
        #[serde(rename = "s")]
        symbol: String,
        #[serde(rename = "c")]
        last: String,
        #[serde(rename = "E")]
        event_time: u64,
    },
    /// Best bid/ask update
    #[serde(rename = "bookTicker")]
    BookTicker {
        #[serde(rename = "s")]
        symbol: String,
        #[serde(rename = "b")]
        bid: String,
        #[serde(rename = "a")]
        ask: String,
    },
}

/// Error object of a rejected WebSocket request
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BinanceWsError {
    pub code: i64,
    pub msg: String,
}

/// Any text frame received on the raw stream endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum BinanceWsMessage {
    Event(BinanceEvent),
    /// Reply to a SUBSCRIBE request (`{"result":null,"id":1}` on success)
    Response {
        id: u64,
        #[serde(default)]
        error: Option<BinanceWsError>,
    },
}

// =============================================================================
// REST Payloads
// =============================================================================

/// `/fapi/v1/exchangeInfo` response (only the fields we use)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub contract_type: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub margin_asset: String,
}

impl SymbolInfo {
    /// Unified form of a live perpetual, `None` for delivery or halted contracts
    pub fn unified_perpetual(&self) -> Option<String> {
        if self.contract_type != "PERPETUAL" || self.status != "TRADING" {
            return None;
        }
        Some(
            UnifiedSymbol::new(&self.base_asset, &self.quote_asset, &self.margin_asset)
                .to_string(),
        )
    }
}

/// `/fapi/v1/premiumIndex?symbol=` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PremiumIndex {
    pub symbol: String,
    pub last_funding_rate: String,
}

/// REST error body (`{"code":-1121,"msg":"Invalid symbol."}`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BinanceApiError {
    pub code: i64,
    pub msg: String,
}

/// Error code for an unknown symbol
pub(crate) const INVALID_SYMBOL_CODE: i64 = -1121;

/// Convert one `/fapi/v1/klines` row
///
/// Rows are positional arrays: `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
pub(crate) fn parse_kline(row: &[serde_json::Value]) -> ExchangeResult<Candle> {
    let invalid = |what: &str| ExchangeError::InvalidResponse(format!("Binance kline: bad {}", what));

    let open_time_ms = row
        .first()
        .and_then(|v| v.as_u64())
        .ok_or_else(|| invalid("open time"))?;

    let field = |idx: usize, name: &str| -> ExchangeResult<f64> {
        row.get(idx)
            .and_then(|v| v.as_str())
            .and_then(|s| parse_price_field(name, s))
            .ok_or_else(|| invalid(name))
    };

    Ok(Candle {
        open_time_ms,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
