//! Application-wide error types using thiserror
//!
//! Layer errors (`ExchangeError`, `TickError`, `AccountError`,
//! `MarketViewError`) convert into `AppError` where they cross into
//! startup or binary code.

use crate::adapters::errors::ExchangeError;
use crate::core::account::AccountError;
use crate::core::engine::TickError;
use crate::core::market::MarketViewError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Market view error: {0}")]
    MarketView(#[from] MarketViewError),

    #[error("Tick error: {0}")]
    Tick(#[from] TickError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
