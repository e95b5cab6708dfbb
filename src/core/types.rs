//! Core data types for the paper-trading pipeline
//!
//! Samples and series produced by the feeds, plus the vocabulary the
//! engine and accounts share (sides, position state, trade records).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Price Samples
// =============================================================================

/// One observed price at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Local receipt time (ms since epoch)
    pub timestamp_ms: u64,
    /// Last traded price, finite and > 0
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp_ms: u64, price: f64) -> Self {
        Self {
            timestamp_ms,
            price,
        }
    }
}

/// Append-only price history of one (venue, instrument) pair
///
/// Timestamps are non-decreasing in arrival order. A sample stamped earlier
/// than the tail is clamped to the tail's timestamp, never reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VenueSeries {
    samples: Vec<PriceSample>,
}

impl VenueSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample; returns the (possibly clamped) stored sample
    pub fn push(&mut self, sample: PriceSample) -> PriceSample {
        let stored = match self.samples.last() {
            Some(tail) if sample.timestamp_ms < tail.timestamp_ms => PriceSample {
                timestamp_ms: tail.timestamp_ms,
                ..sample
            },
            _ => sample,
        };
        self.samples.push(stored);
        stored
    }

    #[inline]
    pub fn latest(&self) -> Option<PriceSample> {
        self.samples.last().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    /// Prices only, in arrival order
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.price)
    }
}

// =============================================================================
// Orders / Positions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Flat,
    InPosition,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::InPosition => write!(f, "IN_POSITION"),
        }
    }
}

// =============================================================================
// Trade Records
// =============================================================================

/// Which transition a trade record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    /// Short A / long B
    Entry,
    /// Buy back A / sell B
    Exit,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Entry => write!(f, "ENTRY"),
            TradeKind::Exit => write!(f, "EXIT"),
        }
    }
}

/// One simulated two-leg transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: uuid::Uuid,
    pub kind: TradeKind,
    /// `pA - pB` that triggered the transition
    pub spread: f64,
    pub price_a: f64,
    pub price_b: f64,
    pub quantity: f64,
    /// Combined equity change since the matching entry (exits only)
    pub realized_pnl: Option<f64>,
    pub timestamp_ms: u64,
}

/// Venue label shared across tasks
pub type VenueLabel = Arc<str>;

// =============================================================================
// Utility
// =============================================================================

/// Get current time in milliseconds since epoch (0 if the clock is before it)
#[inline]
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_series_push_and_latest() {
        let mut series = VenueSeries::new();
        assert!(series.is_empty());
        assert_eq!(series.latest(), None);

        series.push(PriceSample::new(10, 100.0));
        series.push(PriceSample::new(11, 101.0));
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest(), Some(PriceSample::new(11, 101.0)));
        assert_eq!(series.prices().collect::<Vec<_>>(), vec![100.0, 101.0]);
    }

    #[test]
    fn test_series_clamps_out_of_order_timestamp() {
        let mut series = VenueSeries::new();
        series.push(PriceSample::new(20, 100.0));
        let stored = series.push(PriceSample::new(15, 99.0));

        assert_eq!(stored, PriceSample::new(20, 99.0));
        assert_eq!(series.samples()[1].timestamp_ms, 20);
    }

    #[test]
    fn test_position_state_display() {
        assert_eq!(PositionState::Flat.to_string(), "FLAT");
        assert_eq!(PositionState::InPosition.to_string(), "IN_POSITION");
        assert_eq!(PositionState::default(), PositionState::Flat);
    }

    #[test]
    fn test_trade_record_serialization() {
        let record = TradeRecord {
            id: uuid::Uuid::new_v4(),
            kind: TradeKind::Entry,
            spread: 0.7,
            price_a: 100.7,
            price_b: 100.0,
            quantity: 10.0,
            realized_pnl: None,
            timestamp_ms: 1,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"entry\""));
    }

    #[test]
    fn test_current_time_ms() {
        // Should be after 2024-01-01
        assert!(current_time_ms() > 1_704_067_200_000);
    }

    proptest! {
        #[test]
        fn prop_series_timestamps_non_decreasing(
            stamps in proptest::collection::vec(0u64..1_000_000, 1..200)
        ) {
            let mut series = VenueSeries::new();
            for (i, ts) in stamps.iter().enumerate() {
                series.push(PriceSample::new(*ts, 1.0 + i as f64));
            }
            prop_assert_eq!(series.len(), stamps.len());
            for pair in series.samples().windows(2) {
                prop_assert!(pair[0].timestamp_ms <= pair[1].timestamp_ms);
            }
        }
    }
}
