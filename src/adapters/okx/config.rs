//! OKX Configuration
//!
//! Endpoints for the v5 public API.

use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Production public WebSocket URL
const MAINNET_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

/// Production REST base URL
const MAINNET_REST_URL: &str = "https://www.okx.com";

/// OKX drops connections idle for 30s; ping before that
const PING_AFTER_IDLE_SECS: u64 = 25;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for OKX public endpoints
#[derive(Debug, Clone)]
pub struct OkxConfig {
    pub ws_url: String,
    pub rest_url: String,
    /// Send a text "ping" when nothing was received for this long
    pub ping_after_idle: Duration,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            ws_url: MAINNET_WS_URL.to_string(),
            rest_url: MAINNET_REST_URL.to_string(),
            ping_after_idle: Duration::from_secs(PING_AFTER_IDLE_SECS),
        }
    }
}

impl OkxConfig {
    /// Create configuration from environment variables
    ///
    /// `OKX_WS_URL` and `OKX_REST_URL` override the production endpoints.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ws_url: std::env::var("OKX_WS_URL").unwrap_or(defaults.ws_url),
            rest_url: std::env::var("OKX_REST_URL").unwrap_or(defaults.rest_url),
            ..defaults
        }
    }

    /// Config pointing the REST client at a custom base URL (mock servers)
    pub fn with_rest_url(rest_url: impl Into<String>) -> Self {
        Self {
            rest_url: rest_url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_default() {
        let config = OkxConfig::default();
        assert_eq!(config.ws_url, "wss://ws.okx.com:8443/ws/v5/public");
        assert_eq!(config.rest_url, "https://www.okx.com");
        assert_eq!(config.ping_after_idle, Duration::from_secs(25));
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("OKX_WS_URL", "ws://127.0.0.1:9000");
        let config = OkxConfig::from_env();
        assert_eq!(config.ws_url, "ws://127.0.0.1:9000");
        assert_eq!(config.rest_url, "https://www.okx.com");
        std::env::remove_var("OKX_WS_URL");
    }
}
