use crate::models::MapperConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the run configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "ItemMapper.yaml";

/// Configuration manager for loading and saving the YAML run configuration.
///
/// The configuration is optional: when `ItemMapper.yaml` is absent the built-in
/// defaults (the public source URLs, `./mini` and `./pretty` output) are used.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at the specified directory.
    ///
    /// The directory is not created until a configuration is saved.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        }
    }

    /// Load the run configuration.
    ///
    /// # Returns
    /// The loaded MapperConfig, or defaults if the file doesn't exist
    pub fn load_config(&self) -> Result<MapperConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(MapperConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: MapperConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the run configuration, creating the config directory if needed.
    pub fn save_config(&self, config: &MapperConfig) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("Failed to create config directory: {}", self.config_dir)
            })?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = manager.load_config().unwrap();
        assert_eq!(config.sources.request_timeout_secs, 10);
        assert_eq!(config.sources.regional_marketplaces.len(), 4);
    }

    #[test]
    fn test_load_save_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = MapperConfig::default();
        config.output.root = Utf8PathBuf::from("out");
        config.logging.debug_mode = true;
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.output.root, Utf8PathBuf::from("out"));
        assert!(loaded.logging.debug_mode);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "sources: [not, a, map]").unwrap();

        assert!(manager.load_config().is_err());
    }
}
