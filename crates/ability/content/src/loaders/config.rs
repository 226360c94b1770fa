//! Simulation configuration loader.

use std::path::Path;

use ability_core::SimConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for simulation configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing SimConfig
    ///
    /// # Returns
    ///
    /// Returns a SimConfig. Missing keys take their defaults.
    pub fn load(path: &Path) -> LoadResult<SimConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SimConfig> {
        let config: SimConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        if config.tick_delta_ms == 0 {
            anyhow::bail!("tick_delta_ms must be positive");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = ConfigLoader::parse("tick_delta_ms = 20").unwrap();
        assert_eq!(config.tick_delta_ms, 20);
        assert_eq!(config.reconcile_interval, SimConfig::DEFAULT_RECONCILE_INTERVAL);
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert!(ConfigLoader::parse("tick_delta_ms = 0").is_err());
    }
}
