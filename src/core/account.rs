//! Virtual account
//!
//! One simulated venue balance: cash, signed holdings (negative = short),
//! a position flag and the equity history recorded after every order.
//! Pure data and arithmetic, owned by the engine.

use serde::Serialize;
use thiserror::Error;

use super::metrics;
use super::types::{PositionState, Side};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Invalid order price {0} (must be finite and > 0)")]
    InvalidPrice(f64),

    #[error("Invalid order quantity {0} (must be finite and >= 0)")]
    InvalidQuantity(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualAccount {
    cash_balance: f64,
    /// Signed position size; negative is short
    holdings: f64,
    position_state: PositionState,
    /// `cash + holdings * fill price` after each order, seeded with the initial balance
    equity_history: Vec<f64>,
}

impl VirtualAccount {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash_balance: initial_balance,
            holdings: 0.0,
            position_state: PositionState::Flat,
            equity_history: vec![initial_balance],
        }
    }

    /// Fill an order at `price`
    ///
    /// Buy adds `quantity` to holdings and pays `price * quantity`; Sell does
    /// the opposite. The position is `InPosition` whenever holdings are
    /// non-zero afterwards. Invalid inputs leave the account untouched.
    pub fn place_order(&mut self, price: f64, quantity: f64, side: Side) -> Result<(), AccountError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AccountError::InvalidPrice(price));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(AccountError::InvalidQuantity(quantity));
        }

        let notional = price * quantity;
        match side {
            Side::Buy => {
                self.holdings += quantity;
                self.cash_balance -= notional;
            }
            Side::Sell => {
                self.holdings -= quantity;
                self.cash_balance += notional;
            }
        }

        self.position_state = if self.holdings != 0.0 {
            PositionState::InPosition
        } else {
            PositionState::Flat
        };

        self.equity_history.push(self.current_equity(price));
        Ok(())
    }

    /// Mark-to-market equity at `mark`
    #[inline]
    pub fn current_equity(&self, mark: f64) -> f64 {
        self.cash_balance + self.holdings * mark
    }

    /// Worst drawdown of the current position marked against `reference_prices`
    ///
    /// The running peak starts at the equity recorded after the last fill.
    pub fn max_drawdown<I>(&self, reference_prices: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let marks = reference_prices.into_iter().map(|p| self.current_equity(p));
        let seed = self.equity_history.last().copied();
        metrics::max_drawdown(seed.into_iter().chain(marks))
    }

    pub fn cash_balance(&self) -> f64 {
        self.cash_balance
    }

    pub fn holdings(&self) -> f64 {
        self.holdings
    }

    pub fn position_state(&self) -> PositionState {
        self.position_state
    }

    pub fn equity_history(&self) -> &[f64] {
        &self.equity_history
    }
}
