//! OKX collaborator
//!
//! - `stream`: public WebSocket `tickers` channel (`QuoteStream`)
//! - `rest`: public v5 REST endpoints (`MarketDataClient`)

pub mod config;
pub mod rest;
pub mod stream;
pub mod types;

pub use config::OkxConfig;
pub use rest::OkxRest;
pub use stream::OkxStream;
