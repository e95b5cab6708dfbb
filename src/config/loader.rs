//! Configuration loader for YAML files
//!
//! This module handles loading and validating configuration from YAML files.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::AppError;

use super::types::AppConfig;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "SPREAD_PAPER_CONFIG";

/// Resolve the configuration path (`SPREAD_PAPER_CONFIG` or `config.yaml`)
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Validates the configuration rules
///
/// # Arguments
/// * `path` - Path to the configuration YAML file
///
/// # Returns
/// * `Ok(AppConfig)` - Successfully loaded and validated configuration
/// * `Err(AppError)` - File not found, parse error, or validation failure
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!(
            "YAML parse error in '{}': {}",
            path.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = serde_yaml::from_str(yaml_content).map_err(|e| {
        AppError::Config(format!("YAML parse error: {}", e))
    })?;

    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================
