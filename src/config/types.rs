//! Configuration types for the spread paper trader
//!
//! This module defines all configuration structs that are loaded from YAML
//! once at startup. Every section except `venues` has defaults, so a minimal
//! file only names the two venues.

use serde::{Deserialize, Serialize};

use crate::adapters::factory::Exchange;
use crate::adapters::symbol::UnifiedSymbol;
use crate::adapters::shared::ReconnectConfig;
use crate::error::AppError;

// ============================================================================
// Venues
// ============================================================================

/// One side of the pair: a label, the venue that serves it and the instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueConfig {
    /// Display/lookup key in the market view (e.g. "binance-u")
    pub label: String,
    pub exchange: Exchange,
    /// Unified symbol (e.g. "ETH/USDT:USDT")
    pub symbol: String,
}

impl VenueConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.label.trim().is_empty() {
            return Err(AppError::Config("Venue label cannot be empty".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Venue '{}': symbol cannot be empty",
                self.label
            )));
        }
        self.symbol.parse::<UnifiedSymbol>().map_err(|e| {
            AppError::Config(format!("Venue '{}': {}", self.label, e))
        })?;
        Ok(())
    }
}

/// The venue pair; `a` is the short leg on entry, `b` the long leg
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenuePair {
    pub a: VenueConfig,
    pub b: VenueConfig,
}

// ============================================================================
// Strategy
// ============================================================================

/// Threshold strategy parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    /// Open when `pA - pB` rises above this (absolute price units)
    pub entry_threshold: f64,
    /// Close when `pA - pB` falls below this; must be < `entry_threshold`
    pub exit_threshold: f64,
    /// Starting cash of each virtual account
    pub initial_balance: f64,
    /// Evaluation cadence in milliseconds
    pub evaluation_interval_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_threshold: 0.6,
            exit_threshold: 0.2,
            initial_balance: 1000.0,
            evaluation_interval_ms: 2,
        }
    }
}

impl StrategyConfig {
    /// Validate strategy rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: no NaN or Infinity in numeric fields
        if !self.entry_threshold.is_finite() || !self.exit_threshold.is_finite() {
            return Err(AppError::Config(format!(
                "Thresholds must be finite numbers (entry {}, exit {})",
                self.entry_threshold, self.exit_threshold
            )));
        }

        // Rule: exit < entry, otherwise a position could open and close on the same spread
        if self.exit_threshold >= self.entry_threshold {
            return Err(AppError::Config(format!(
                "exit_threshold ({}) must be strictly less than entry_threshold ({})",
                self.exit_threshold, self.entry_threshold
            )));
        }

        if !self.initial_balance.is_finite() || self.initial_balance < 0.0 {
            return Err(AppError::Config(format!(
                "initial_balance must be a finite, non-negative number (got {})",
                self.initial_balance
            )));
        }

        if self.evaluation_interval_ms == 0 {
            return Err(AppError::Config(
                "evaluation_interval_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Feeds
// ============================================================================

/// What a price feed does when its stream fails
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedErrorPolicy {
    /// Log and end the feed; the other venue keeps streaming
    #[default]
    Stop,
    /// Reconnect with exponential backoff, end the feed when all attempts fail
    Retry {
        max_attempts: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
    },
}

impl FeedErrorPolicy {
    /// Reconnect schedule for the `Retry` policy
    pub fn reconnect_config(&self) -> Option<ReconnectConfig> {
        match *self {
            FeedErrorPolicy::Stop => None,
            FeedErrorPolicy::Retry {
                max_attempts,
                initial_delay_ms,
                max_delay_ms,
            } => Some(ReconnectConfig {
                max_attempts,
                initial_delay_ms,
                max_delay_ms,
                ..ReconnectConfig::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FeedConfig {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub error_policy: FeedErrorPolicy,
}

// ============================================================================
// Presentation / Screeners
// ============================================================================

/// Periodic log summary (used when the terminal dashboard is off)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub interval_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Top-movers screener parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoversConfig {
    pub exchange: Exchange,
    pub timeframe: String,
    /// Candles per symbol
    pub limit: u32,
    /// How many symbols to print
    pub top: usize,
}

impl Default for MoversConfig {
    fn default() -> Self {
        Self {
            exchange: Exchange::Binance,
            timeframe: "1d".to_string(),
            limit: 7,
            top: 50,
        }
    }
}

/// Batch screener parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Venues compared by the funding screener
    pub exchanges: Vec<Exchange>,
    /// Unified symbols compared by the funding screener
    pub symbols: Vec<String>,
    pub movers: MoversConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            exchanges: Exchange::ALL.to_vec(),
            symbols: ["BTC/USDT:USDT", "ETH/USDT:USDT", "SOL/USDT:USDT", "BNB/USDT:USDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            movers: MoversConfig::default(),
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.movers.limit == 0 {
            return Err(AppError::Config("screener.movers.limit must be at least 1".to_string()));
        }
        for symbol in &self.symbols {
            symbol.parse::<UnifiedSymbol>().map_err(|e| {
                AppError::Config(format!("screener.symbols: {}", e))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub venues: VenuePair,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub screener: ScreenerConfig,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.venues.a.validate()?;
        self.venues.b.validate()?;

        // Rule: labels key the market view, so they must differ
        if self.venues.a.label == self.venues.b.label {
            return Err(AppError::Config(format!(
                "Venue labels must differ (both are '{}')",
                self.venues.a.label
            )));
        }

        self.strategy.validate()?;

        if self.report.interval_secs == 0 {
            return Err(AppError::Config("report.interval_secs must be at least 1".to_string()));
        }

        self.screener.validate()?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
