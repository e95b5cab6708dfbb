//! Shared helpers for exchange collaborators
//!
//! Common utilities for WebSocket connection management and the opt-in
//! reconnection policy of the price feeds.

pub mod reconnect;
pub mod websocket;

pub use reconnect::{backoff_delay, reconnect_stream, ReconnectConfig};
pub use websocket::{connect_tls, TlsWebSocketStream};
