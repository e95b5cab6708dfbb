//! Configuration module for the paper trader and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `VenueConfig`, `StrategyConfig`, ...)
//! - YAML loading functionality (`load_config`)
//! - Logging configuration (`init_logging`)

mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{
    AppConfig, FeedConfig, FeedErrorPolicy, MoversConfig, ReportConfig, ScreenerConfig,
    StrategyConfig, VenueConfig, VenuePair,
};

// Re-export loader functions
pub use loader::{config_path, load_config, load_config_from_str, CONFIG_PATH_ENV};

// Re-export logging functions
pub use logging::{init_logging, is_tui_mode};
