//! Configuration handling for the hcvgt CLI
//!
//! Supports loading configuration from hcvgt.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hcvgt.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// blastn executable (name on PATH or full path)
    #[serde(default = "default_blastn")]
    pub blastn: PathBuf,

    /// Reference panel FASTA, labelled with genotypes in the second header field
    #[serde(default = "default_references")]
    pub references: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Persistent result cache file
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_blastn() -> PathBuf { PathBuf::from("blastn") }
fn default_references() -> PathBuf { PathBuf::from("hcv-refs.fasta") }
fn default_cache_path() -> PathBuf { PathBuf::from(".genotypes.cache") }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            blastn: default_blastn(),
            references: default_references(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Apply command line overrides on top of file values
    pub fn with_overrides(
        mut self,
        blastn: Option<PathBuf>,
        references: Option<PathBuf>,
        cache: Option<PathBuf>,
    ) -> Self {
        if let Some(blastn) = blastn {
            self.search.blastn = blastn;
        }
        if let Some(references) = references {
            self.search.references = references;
        }
        if let Some(cache) = cache {
            self.cache.path = cache;
        }
        self
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.blastn, PathBuf::from("blastn"));
        assert_eq!(config.search.references, PathBuf::from("hcv-refs.fasta"));
        assert_eq!(config.cache.path, PathBuf::from(".genotypes.cache"));
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.search.references = PathBuf::from("/data/refs.fasta");
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded_config = Config::load_from_file(temp_file.path())?;

        assert_eq!(loaded_config.search.references, PathBuf::from("/data/refs.fasta"));
        assert_eq!(loaded_config.cache.path, config.cache.path);

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        std::fs::write(temp_file.path(), "[cache]\npath = \"/tmp/gt.cache\"\n")?;

        let config = Config::load_from_file(temp_file.path())?;
        assert_eq!(config.cache.path, PathBuf::from("/tmp/gt.cache"));
        assert_eq!(config.search.blastn, PathBuf::from("blastn"));

        Ok(())
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            None,
            Some(PathBuf::from("panel.fasta")),
            Some(PathBuf::from("other.cache")),
        );
        assert_eq!(config.search.blastn, PathBuf::from("blastn"));
        assert_eq!(config.search.references, PathBuf::from("panel.fasta"));
        assert_eq!(config.cache.path, PathBuf::from("other.cache"));
    }

    #[test]
    fn test_example_toml_generation() {
        let example = Config::example_toml().unwrap();
        assert!(example.contains("[search]"));
        assert!(example.contains("[cache]"));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[search\nblastn = ").unwrap();
        assert!(Config::load_from_file(temp_file.path()).is_err());
    }
}
