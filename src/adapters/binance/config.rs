//! Binance Configuration
//!
//! Endpoints for the USDⓈ-M futures public API.

// =============================================================================
// Constants
// =============================================================================

/// Production WebSocket URL (raw stream endpoint, subscriptions sent as messages)
const MAINNET_WS_URL: &str = "wss://fstream.binance.com/ws";

/// Production REST base URL
const MAINNET_REST_URL: &str = "https://fapi.binance.com";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for Binance futures public endpoints
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub ws_url: String,
    pub rest_url: String,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            ws_url: MAINNET_WS_URL.to_string(),
            rest_url: MAINNET_REST_URL.to_string(),
        }
    }
}

impl BinanceConfig {
    /// Create configuration from environment variables
    ///
    /// `BINANCE_WS_URL` and `BINANCE_REST_URL` override the production endpoints.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ws_url: std::env::var("BINANCE_WS_URL").unwrap_or(defaults.ws_url),
            rest_url: std::env::var("BINANCE_REST_URL").unwrap_or(defaults.rest_url),
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
        let config = BinanceConfig::default();
        assert_eq!(config.ws_url, "wss://fstream.binance.com/ws");
        assert_eq!(config.rest_url, "https://fapi.binance.com");
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("BINANCE_REST_URL", "http://127.0.0.1:9999");
        let config = BinanceConfig::from_env();
        assert_eq!(config.rest_url, "http://127.0.0.1:9999");
        assert_eq!(config.ws_url, "wss://fstream.binance.com/ws");
        std::env::remove_var("BINANCE_REST_URL");
    }
}
