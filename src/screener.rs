//! Market screeners
//!
//! Batch reports over the REST collaborators, run by the `screener` binary:
//! - **funding**: per-symbol funding rates across venues with the max-min
//!   differential, widest first
//! - **movers**: per-market score `|last/first - 1| + stddev(closes)` over
//!   recent candles, highest first
//!
//! Per-symbol failures are logged and skipped; they never abort a report.

use std::cmp::Ordering;
use std::fmt::Write as _;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::adapters::{ExchangeResult, MarketDataClient, UnifiedSymbol};

/// Concurrent OHLCV requests during a movers scan
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

// =============================================================================
// Funding
// =============================================================================

/// Funding rates of one symbol across venues
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRow {
    pub symbol: String,
    /// (exchange, rate) in venue order
    pub rates: Vec<(&'static str, f64)>,
}

impl FundingRow {
    /// Venue paying the highest rate
    pub fn max(&self) -> Option<(&'static str, f64)> {
        self.rates
            .iter()
            .copied()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    }

    /// Venue paying the lowest rate
    pub fn min(&self) -> Option<(&'static str, f64)> {
        self.rates
            .iter()
            .copied()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    }

    /// `max - min`, 0 with fewer than two venues
    pub fn differential(&self) -> f64 {
        match (self.max(), self.min()) {
            (Some(hi), Some(lo)) => hi.1 - lo.1,
            _ => 0.0,
        }
    }
}

fn normalize(symbol: &str) -> Option<String> {
    symbol.parse::<UnifiedSymbol>().ok().map(|s| s.to_string())
}

/// Collect funding rates of `symbols` from every client
///
/// A symbol missing from a venue's market list is skipped for that venue;
/// symbols with no rate anywhere are dropped. Rows are sorted by
/// differential, widest first.
pub async fn funding_table<C>(clients: &[C], symbols: &[String]) -> Vec<FundingRow>
where
    C: MarketDataClient,
{
    let wanted: Vec<String> = symbols
        .iter()
        .filter_map(|raw| match normalize(raw) {
            Some(unified) => Some(unified),
            None => {
                warn!(symbol = %raw, "[SCREENER] Invalid symbol skipped");
                None
            }
        })
        .collect();

    let mut rows: Vec<FundingRow> = wanted
        .iter()
        .map(|unified| FundingRow {
            symbol: unified.clone(),
            rates: Vec::new(),
        })
        .collect();

    for client in clients {
        let exchange = client.exchange_name();
        let markets: Vec<String> = match client.list_markets().await {
            Ok(markets) => markets.iter().filter_map(|m| normalize(m)).collect(),
            Err(e) => {
                warn!(exchange, error = %e, "[SCREENER] Market list unavailable, venue skipped");
                continue;
            }
        };

        for (row, unified) in rows.iter_mut().zip(&wanted) {
            if !markets.contains(unified) {
                warn!(exchange, symbol = %unified, "[SCREENER] Symbol not listed");
                continue;
            }
            match client.fetch_funding_rate(unified).await {
                Ok(rate) if rate.is_finite() => row.rates.push((exchange, rate)),
                Ok(rate) => warn!(exchange, symbol = %unified, rate, "[SCREENER] Non-finite funding rate"),
                Err(e) => warn!(exchange, symbol = %unified, error = %e, "[SCREENER] Funding rate unavailable"),
            }
        }
    }

    rows.retain(|row| !row.rates.is_empty());
    rows.sort_by(|a, b| {
        b.differential()
            .partial_cmp(&a.differential())
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// Plain-text table of `rows`
pub fn format_funding_table(rows: &[FundingRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>12} {:>12} {:>12}  high / low",
        "symbol", "max", "min", "diff"
    );
    for row in rows {
        let (Some(hi), Some(lo)) = (row.max(), row.min()) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:<20} {:>12.6} {:>12.6} {:>12.6}  {} / {}",
            row.symbol,
            hi.1,
            lo.1,
            row.differential(),
            hi.0,
            lo.0
        );
        for (exchange, rate) in &row.rates {
            let _ = writeln!(out, "    {:<16} {:>12.6}", exchange, rate);
        }
    }
    out
}

// =============================================================================
// Movers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoverScore {
    pub symbol: String,
    /// `last / first - 1`
    pub price_change: f64,
    /// Population standard deviation of the closes
    pub volatility: f64,
    pub score: f64,
}

/// Score a close series, `None` when empty or the first close is not positive
pub fn score_closes(symbol: &str, closes: &[f64]) -> Option<MoverScore> {
    let (first, last) = (*closes.first()?, *closes.last()?);
    if closes.iter().any(|c| !c.is_finite()) || first <= 0.0 {
        return None;
    }

    let n = closes.len() as f64;
    let mean = closes.iter().sum::<f64>() / n;
    let variance = closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;

    let price_change = last / first - 1.0;
    let volatility = variance.sqrt();
    Some(MoverScore {
        symbol: symbol.to_string(),
        price_change,
        volatility,
        score: price_change.abs() + volatility,
    })
}

/// Score every market of `client` and return the best `top`
///
/// Only the market list is fatal; a symbol whose candles cannot be fetched
/// or scored is logged and left out.
pub async fn top_movers<C>(
    client: &C,
    timeframe: &str,
    limit: u32,
    top: usize,
) -> ExchangeResult<Vec<MoverScore>>
where
    C: MarketDataClient,
{
    let exchange = client.exchange_name();
    let markets = client.list_markets().await?;
    debug!(exchange, markets = markets.len(), "[SCREENER] Scanning movers");

    let mut scores: Vec<MoverScore> = stream::iter(markets)
        .map(|symbol| async move {
            match client.fetch_ohlcv(&symbol, timeframe, limit).await {
                Ok(candles) => {
                    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
                    let score = score_closes(&symbol, &closes);
                    if score.is_none() {
                        warn!(exchange, symbol = %symbol, "[SCREENER] Not enough data to score");
                    }
                    score
                }
                Err(e) => {
                    warn!(exchange, symbol = %symbol, error = %e, "[SCREENER] Candles unavailable");
                    None
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .filter_map(|score| async move { score })
        .collect()
        .await;

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    scores.truncate(top);
    Ok(scores)
}

pub fn format_movers(scores: &[MoverScore]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<20} {:>10} {:>14} {:>14}",
        "#", "symbol", "change", "volatility", "score"
    );
    for (i, s) in scores.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {:>9.2}% {:>14.6} {:>14.6}",
            i + 1,
            s.symbol,
            s.price_change * 100.0,
            s.volatility,
            s.score
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_utils::StaticMarketData;

    #[test]
    fn test_score_closes() {
        let score = score_closes("ETH/USDT:USDT", &[100.0, 110.0]).unwrap();
        assert!((score.price_change - 0.1).abs() < 1e-12);
        assert!((score.volatility - 5.0).abs() < 1e-12);
        assert!((score.score - 5.1).abs() < 1e-12);
    }

    #[test]
    fn test_score_single_close_is_zero() {
        let score = score_closes("X/USDT:USDT", &[42.0]).unwrap();
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_score_rejects_unusable_series() {
        assert!(score_closes("X", &[]).is_none());
        assert!(score_closes("X", &[0.0, 1.0]).is_none());
        assert!(score_closes("X", &[1.0, f64::NAN]).is_none());
    }

    #[tokio::test]
    async fn test_funding_table_sorted_by_differential() {
        let binance = StaticMarketData::new("binance")
            .with_funding("BTC/USDT:USDT", 0.0001)
            .with_funding("ETH/USDT:USDT", 0.0003);
        let okx = StaticMarketData::new("okx")
            .with_funding("BTC/USDT:USDT", 0.0004)
            .with_funding("ETH/USDT:USDT", 0.0002);
        let symbols = vec!["BTC/USDT:USDT".to_string(), "eth/usdt".to_string()];

        let rows = funding_table(&[binance, okx], &symbols).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "BTC/USDT:USDT");
        assert_eq!(rows[0].max(), Some(("okx", 0.0004)));
        assert_eq!(rows[0].min(), Some(("binance", 0.0001)));
        assert!((rows[0].differential() - 0.0003).abs() < 1e-12);
        assert_eq!(rows[1].symbol, "ETH/USDT:USDT");
        assert!((rows[1].differential() - 0.0001).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_funding_table_skips_unlisted_and_invalid() {
        let binance = StaticMarketData::new("binance").with_funding("BTC/USDT:USDT", 0.0001);
        let okx = StaticMarketData::new("okx");
        let symbols = vec![
            "BTC/USDT:USDT".to_string(),
            "DOGE/USDT:USDT".to_string(),
            "not a symbol".to_string(),
        ];

        let rows = funding_table(&[binance, okx], &symbols).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rates, vec![("binance", 0.0001)]);
        assert_eq!(rows[0].differential(), 0.0);

        let table = format_funding_table(&rows);
        assert!(table.contains("BTC/USDT:USDT"));
        assert!(!table.contains("DOGE"));
    }

    #[tokio::test]
    async fn test_top_movers_ranks_and_truncates() {
        let client = StaticMarketData::new("binance")
            .with_closes("AAA/USDT:USDT", &[1.0, 1.0, 1.0])
            .with_closes("BBB/USDT:USDT", &[10.0, 12.0, 14.0])
            .with_closes("CCC/USDT:USDT", &[100.0, 90.0])
            .with_closes("BAD/USDT:USDT", &[0.0, 5.0]);

        let movers = top_movers(&client, "1d", 7, 2).await.unwrap();

        let symbols: Vec<&str> = movers.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["CCC/USDT:USDT", "BBB/USDT:USDT"]);
        assert!(movers[0].score > movers[1].score);

        let table = format_movers(&movers);
        assert!(table.contains("-10.00%"));
    }

    #[tokio::test]
    async fn test_top_movers_uses_latest_limit_candles() {
        let client =
            StaticMarketData::new("binance").with_closes("AAA/USDT:USDT", &[50.0, 100.0, 100.0]);

        let movers = top_movers(&client, "1d", 2, 10).await.unwrap();
        assert_eq!(movers[0].score, 0.0);
    }
}
