//! OKX Types
//!
//! Payloads of the v5 public API.
//!
//! WebSocket `tickers` push:
//!   `{"arg":{"channel":"tickers","instId":"ETH-USDT-SWAP"},"data":[{"last":"..","bidPx":"..","askPx":"..","ts":".."}]}`
//! WebSocket events:
//!   `{"event":"subscribe","arg":{..}}`, `{"event":"error","code":"60012","msg":".."}`
//! REST envelope:
//!   `{"code":"0","msg":"","data":[..]}`

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::symbol::UnifiedSymbol;
use crate::adapters::types::{parse_price_field, Candle, Quote};

pub(crate) const EXCHANGE_NAME: &str = "okx";

/// REST error code for an unknown instrument
pub(crate) const INSTRUMENT_NOT_FOUND_CODE: &str = "51001";

// =============================================================================
// Symbols
// =============================================================================

/// Convert a unified symbol to the OKX swap id (`ETH/USDT:USDT` -> `ETH-USDT-SWAP`)
pub fn to_okx_symbol(unified: &str) -> ExchangeResult<String> {
    let sym: UnifiedSymbol = unified.parse()?;
    Ok(format!("{}-{}-SWAP", sym.base, sym.quote))
}

/// Map a unified timeframe to an OKX `bar` (hours and above are upper-case)
pub fn to_okx_bar(timeframe: &str) -> String {
    if timeframe.ends_with('m') {
        timeframe.to_string()
    } else {
        timeframe.to_uppercase()
    }
}

// =============================================================================
// WebSocket Message Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OkxArg {
    pub channel: String,
    #[serde(default)]
    pub inst_id: Option<String>,
}

/// One entry of a `tickers` push
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OkxTicker {
    pub inst_id: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub bid_px: String,
    #[serde(default)]
    pub ask_px: String,
    pub ts: String,
}

impl OkxTicker {
    pub fn to_quote(&self) -> Quote {
        Quote {
            bid: parse_price_field("bidPx", &self.bid_px),
            ask: parse_price_field("askPx", &self.ask_px),
            last: parse_price_field("last", &self.last),
            timestamp_ms: self.ts.parse().unwrap_or(0),
        }
    }
}

/// Any JSON text frame on the public endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OkxWsMessage {
    /// Channel data push
    Push { arg: OkxArg, data: Vec<OkxTicker> },
    /// Subscription acknowledgement or error
    Event {
        event: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        msg: Option<String>,
    },
}

// =============================================================================
// REST Payloads
// =============================================================================

/// Common REST envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OkxResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `/api/v5/public/instruments?instType=SWAP` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OkxInstrument {
    pub inst_id: String,
    /// Underlying, e.g. "ETH-USDT"
    pub uly: String,
    pub settle_ccy: String,
    pub state: String,
}

impl OkxInstrument {
    /// Unified form of a live swap
    pub fn unified(&self) -> Option<String> {
        if self.state != "live" {
            return None;
        }
        let (base, quote) = self.uly.split_once('-')?;
        Some(UnifiedSymbol::new(base, quote, &self.settle_ccy).to_string())
    }
}

/// `/api/v5/public/funding-rate?instId=` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OkxFundingRate {
    pub inst_id: String,
    pub funding_rate: String,
}

/// Convert one `/api/v5/market/candles` row
///
/// Rows are string arrays: `[ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`.
pub(crate) fn parse_candle(row: &[String]) -> ExchangeResult<Candle> {
    let invalid = |what: &str| ExchangeError::InvalidResponse(format!("OKX candle: bad {}", what));

    let open_time_ms = row
        .first()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| invalid("ts"))?;

    let field = |idx: usize, name: &str| -> ExchangeResult<f64> {
        row.get(idx)
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
