//! Logging setup for the paper trader
//!
//! # Environment Variables
//! - `LOG_FORMAT`: `json` (default), `pretty`, or `tui`
//! - `RUST_LOG`: Log level filter (default: `info`)
//!
//! In `tui` mode the subscriber is built by the dashboard (see
//! `tui::logging::TuiLayer`), so `init_logging()` must not be called.

use tracing_subscriber::EnvFilter;

/// Output format selected by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Tui,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value; anything unrecognized falls back to JSON
    pub fn parse(value: &str) -> Self {
        match value {
            "pretty" => LogFormat::Pretty,
            "tui" => LogFormat::Tui,
            _ => LogFormat::Json,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|f| Self::parse(&f))
            .unwrap_or(LogFormat::Json)
    }
}

/// Check if the terminal dashboard is requested (`LOG_FORMAT=tui`)
pub fn is_tui_mode() -> bool {
    LogFormat::from_env() == LogFormat::Tui
}

/// `RUST_LOG` filter, `info` when unset or invalid
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber for the `json` and `pretty` formats
pub fn init_logging() {
    match LogFormat::from_env() {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .pretty()
                .init();
        }
        LogFormat::Tui => {
            // Subscriber is installed by the dashboard with its TuiLayer
            debug_assert!(
                false,
                "init_logging() called in TUI mode, subscriber must be set up via TuiLayer"
            );
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .json()
                .init();
        }
    }
}
