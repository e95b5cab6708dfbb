//! Binance USDⓈ-M futures collaborator
//!
//! Public market data only: ticker + book ticker over WebSocket, markets,
//! premium index (funding) and klines over REST.

pub mod config;
pub mod rest;
pub mod stream;
pub mod types;

pub use config::BinanceConfig;
pub use rest::BinanceRest;
pub use stream::BinanceStream;
