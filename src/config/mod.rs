//! Configuration loading and validation

mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
pub use validation::validate;

use crate::ConfigResult;
use std::path::Path;

/// Loads and validates a TOML configuration file
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}
