//! Arbitrage engine
//!
//! Threshold state machine over the spread `pA - pB` of two venues:
//! - **Flat -> InPosition** when `spread > entry_threshold`: short A, long B,
//!   sized by B's cash (`quantity = cashB / pB`)
//! - **InPosition -> Flat** when `spread < exit_threshold`: buy back A's short,
//!   sell B's long (`quantity = |holdingsA|`)
//!
//! Both legs are applied to staged copies of the accounts and committed
//! together, so no tick ever leaves a half-filled pair behind. The engine does
//! no I/O besides reading the latest prices from the market view.

use serde::Serialize;
use thiserror::Error;

use crate::config::StrategyConfig;
use crate::error::AppError;

use super::account::{AccountError, VirtualAccount};
use super::market::SharedMarketView;
use super::metrics;
use super::types::{current_time_ms, PositionState, Side, TradeKind, TradeRecord, VenueLabel};

// =============================================================================
// Errors / Outcomes
// =============================================================================

/// A tick that could not be applied; the engine is left unchanged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    #[error("Non-positive or non-finite price (a={a}, b={b})")]
    NonPositivePrice { a: f64, b: f64 },

    #[error("Invalid order quantity {0}")]
    InvalidQuantity(f64),

    #[error("Leg states disagree after transition (a={a}, b={b})")]
    LegMismatch { a: PositionState, b: PositionState },

    #[error("Order rejected: {0}")]
    Order(#[from] AccountError),
}

/// What a tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// At least one venue has no sample yet
    AwaitingPrices,
    /// Prices evaluated, no threshold crossed
    Hold { spread: f64 },
    Entered(TradeRecord),
    Exited(TradeRecord),
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub initial_balance: f64,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        StrategyConfig {
            entry_threshold: self.entry_threshold,
            exit_threshold: self.exit_threshold,
            initial_balance: self.initial_balance,
            ..StrategyConfig::default()
        }
        .validate()
    }
}

impl From<&StrategyConfig> for EngineConfig {
    fn from(strategy: &StrategyConfig) -> Self {
        Self {
            entry_threshold: strategy.entry_threshold,
            exit_threshold: strategy.exit_threshold,
            initial_balance: strategy.initial_balance,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Read-only copy of the engine state for presenters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub venue_a: VenueLabel,
    pub venue_b: VenueLabel,
    pub state: PositionState,
    pub price_a: Option<f64>,
    pub price_b: Option<f64>,
    pub spread: Option<f64>,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub account_a: VirtualAccount,
    pub account_b: VirtualAccount,
    /// Combined mark-to-market equity of both legs
    pub equity_curve: Vec<f64>,
    pub max_drawdown: f64,
    pub trades: Vec<TradeRecord>,
    pub ticks: u64,
    pub tick_errors: u64,
}

impl EngineSnapshot {
    /// Latest combined equity
    pub fn equity(&self) -> f64 {
        self.equity_curve.last().copied().unwrap_or(0.0)
    }

    /// Sum of realized PnL over closed round trips
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().filter_map(|t| t.realized_pnl).sum()
    }
}

// =============================================================================
// ArbitrageEngine
// =============================================================================

pub struct ArbitrageEngine {
    config: EngineConfig,
    venue_a: VenueLabel,
    venue_b: VenueLabel,
    account_a: VirtualAccount,
    account_b: VirtualAccount,
    state: PositionState,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<f64>,
    last_prices: Option<(f64, f64)>,
    last_spread: Option<f64>,
    /// Combined equity when the open position was entered
    entry_equity: Option<f64>,
    ticks: u64,
    tick_errors: u64,
}

impl ArbitrageEngine {
    /// Create an engine trading `venue_a` (short leg) against `venue_b` (long leg)
    ///
    /// Fails with `AppError::Config` when `exit_threshold >= entry_threshold`
    /// or a parameter is not finite.
    pub fn new(
        config: EngineConfig,
        venue_a: impl Into<VenueLabel>,
        venue_b: impl Into<VenueLabel>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let account_a = VirtualAccount::new(config.initial_balance);
        let account_b = VirtualAccount::new(config.initial_balance);
        Ok(Self::with_accounts(config, venue_a.into(), venue_b.into(), account_a, account_b))
    }

    fn with_accounts(
        config: EngineConfig,
        venue_a: VenueLabel,
        venue_b: VenueLabel,
        account_a: VirtualAccount,
        account_b: VirtualAccount,
    ) -> Self {
        let state = account_a.position_state();
        let seed = account_a.cash_balance() + account_b.cash_balance();
        Self {
            config,
            venue_a,
            venue_b,
            account_a,
            account_b,
            state,
            trades: Vec::new(),
            equity_curve: vec![seed],
            last_prices: None,
            last_spread: None,
            entry_equity: None,
            ticks: 0,
            tick_errors: 0,
        }
    }

    /// Read the latest prices from `view` and evaluate them
    pub async fn tick(&mut self, view: &SharedMarketView) -> Result<TickOutcome, TickError> {
        let price_a = view.latest(&self.venue_a).await.map(|s| s.price);
        let price_b = view.latest(&self.venue_b).await.map(|s| s.price);
        self.evaluate(price_a, price_b)
    }

    /// Evaluate one pair of latest prices
    ///
    /// Repeating the same inputs is idempotent: thresholds are only checked
    /// in the state where they apply.
    pub fn evaluate(
        &mut self,
        price_a: Option<f64>,
        price_b: Option<f64>,
    ) -> Result<TickOutcome, TickError> {
        self.ticks += 1;
        let result = self.evaluate_inner(price_a, price_b);
        if result.is_err() {
            self.tick_errors += 1;
        }
        result
    }

    fn evaluate_inner(
        &mut self,
        price_a: Option<f64>,
        price_b: Option<f64>,
    ) -> Result<TickOutcome, TickError> {
        let (pa, pb) = match (price_a, price_b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(TickOutcome::AwaitingPrices),
        };

        let valid = |p: f64| p.is_finite() && p > 0.0;
        if !valid(pa) || !valid(pb) {
            return Err(TickError::NonPositivePrice { a: pa, b: pb });
        }

        let spread = pa - pb;
        self.last_spread = Some(spread);
        self.mark(pa, pb);

        match self.state {
            PositionState::Flat if spread > self.config.entry_threshold => {
                self.enter(pa, pb, spread).map(TickOutcome::Entered)
            }
            PositionState::InPosition if spread < self.config.exit_threshold => {
                self.exit(pa, pb, spread).map(TickOutcome::Exited)
            }
            _ => Ok(TickOutcome::Hold { spread }),
        }
    }

    /// Record combined equity when a new price pair is observed
    fn mark(&mut self, pa: f64, pb: f64) {
        if self.last_prices == Some((pa, pb)) {
            return;
        }
        self.last_prices = Some((pa, pb));
        let equity = self.combined_equity(pa, pb);
        self.equity_curve.push(equity);
    }

    fn combined_equity(&self, pa: f64, pb: f64) -> f64 {
        self.account_a.current_equity(pa) + self.account_b.current_equity(pb)
    }

    fn enter(&mut self, pa: f64, pb: f64, spread: f64) -> Result<TradeRecord, TickError> {
        let quantity = self.account_b.cash_balance() / pb;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(TickError::InvalidQuantity(quantity));
        }

        self.apply_legs(pa, pb, quantity, Side::Sell, Side::Buy)?;
        self.entry_equity = Some(self.combined_equity(pa, pb));

        let record = self.record(TradeKind::Entry, spread, pa, pb, quantity, None);
        tracing::info!(
            event_type = "TRADE_ENTRY",
            venue_short = %self.venue_a,
            venue_long = %self.venue_b,
            spread = %format!("{:.4}", spread),
            entry_threshold = self.config.entry_threshold,
            price_a = pa,
            price_b = pb,
            quantity = quantity,
            trade_id = %record.id,
            "[TRADE] Position opened"
        );
        Ok(record)
    }

    fn exit(&mut self, pa: f64, pb: f64, spread: f64) -> Result<TradeRecord, TickError> {
        let quantity = self.account_a.holdings().abs();

        self.apply_legs(pa, pb, quantity, Side::Buy, Side::Sell)?;
        let equity = self.combined_equity(pa, pb);
        let realized = self.entry_equity.take().map(|entry| equity - entry);

        let record = self.record(TradeKind::Exit, spread, pa, pb, quantity, realized);
        tracing::info!(
            event_type = "TRADE_EXIT",
            spread = %format!("{:.4}", spread),
            exit_threshold = self.config.exit_threshold,
            price_a = pa,
            price_b = pb,
            quantity = quantity,
            realized_pnl = ?realized,
            equity = equity,
            trade_id = %record.id,
            "[EXIT] Position closed"
        );
        Ok(record)
    }

    /// Fill both legs on staged copies and commit only if they agree
    fn apply_legs(
        &mut self,
        pa: f64,
        pb: f64,
        quantity: f64,
        side_a: Side,
        side_b: Side,
    ) -> Result<(), TickError> {
        let mut staged_a = self.account_a.clone();
        let mut staged_b = self.account_b.clone();
        staged_a.place_order(pa, quantity, side_a)?;
        staged_b.place_order(pb, quantity, side_b)?;

        let (state_a, state_b) = (staged_a.position_state(), staged_b.position_state());
        if state_a != state_b {
            tracing::error!(
                state_a = %state_a,
                state_b = %state_b,
                "[TRADE] Leg mismatch, transition discarded"
            );
            return Err(TickError::LegMismatch {
                a: state_a,
                b: state_b,
            });
        }

        self.account_a = staged_a;
        self.account_b = staged_b;
        self.state = state_a;
        Ok(())
    }

    fn record(
        &mut self,
        kind: TradeKind,
        spread: f64,
        price_a: f64,
        price_b: f64,
        quantity: f64,
        realized_pnl: Option<f64>,
    ) -> TradeRecord {
        let record = TradeRecord {
            id: uuid::Uuid::new_v4(),
            kind,
            spread,
            price_a,
            price_b,
            quantity,
            realized_pnl,
            timestamp_ms: current_time_ms(),
        };
        self.trades.push(record.clone());
        record
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn account_a(&self) -> &VirtualAccount {
        &self.account_a
    }

    pub fn account_b(&self) -> &VirtualAccount {
        &self.account_b
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn venues(&self) -> (&str, &str) {
        (&self.venue_a, &self.venue_b)
    }

    /// MDD of the combined cross-leg equity curve
    pub fn max_drawdown(&self) -> f64 {
        metrics::max_drawdown(self.equity_curve.iter().copied())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            venue_a: self.venue_a.clone(),
            venue_b: self.venue_b.clone(),
            state: self.state,
            price_a: self.last_prices.map(|(a, _)| a),
            price_b: self.last_prices.map(|(_, b)| b),
            spread: self.last_spread,
            entry_threshold: self.config.entry_threshold,
            exit_threshold: self.config.exit_threshold,
            account_a: self.account_a.clone(),
            account_b: self.account_b.clone(),
            equity_curve: self.equity_curve.clone(),
            max_drawdown: self.max_drawdown(),
            trades: self.trades.clone(),
            ticks: self.ticks,
            tick_errors: self.tick_errors,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
