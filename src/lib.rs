//! Cross-venue spread paper trader
//!
//! Streams the last traded price of one instrument from two venues, trades
//! the price difference on two simulated accounts and reports equity and
//! drawdown:
//! - Exchange collaborators (Binance, OKX): ticker streams and REST metadata
//! - Shared market view, price feeds, arbitrage engine, virtual accounts
//! - Evaluation scheduler and presenters (periodic report, terminal dashboard)
//! - Funding and movers screeners

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod screener;
pub mod tui;

pub use error::AppError;
