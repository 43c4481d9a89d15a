//! Engine configuration loader.

use std::path::Path;

use game_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
///
/// Keys left out of the file keep their [`EngineConfig::new`] defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)?;
        if config.max_dispatch_depth == 0 {
            anyhow::bail!("max_dispatch_depth must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let config = ConfigLoader::parse("escort_max_player_distance = 30.0\n").unwrap();
        assert_eq!(config.escort_max_player_distance, 30.0);
        assert_eq!(config.max_dispatch_depth, EngineConfig::DEFAULT_MAX_DISPATCH_DEPTH);
        assert!(config.text_over_check);
    }

    #[test]
    fn zero_dispatch_depth_is_refused() {
        assert!(ConfigLoader::parse("max_dispatch_depth = 0").is_err());
        assert!(ConfigLoader::parse("max_dispatch_depth = \"deep\"").is_err());
    }
}
