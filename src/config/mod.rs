//! Configuration management for Mnemo
//!
//! Loads the TOML configuration file, falls back to defaults when it is
//! absent, and owns the fixed, versioned schema identifier the store is
//! initialized from.

use crate::error::{MnemoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta", default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: "1".to_string(),
            created_at: current_timestamp(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the store file; `~` is expanded relative to the home directory
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("~/.local/share/mnemo/mnemo.db"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name; "hash" selects the offline token-bucket backend
    pub model: String,
    /// Optional cache directory for downloaded model files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text-v1.5".to_string(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MnemoError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MnemoError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, or fall back to defaults
    /// when no config file has been written yet
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MnemoError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| MnemoError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Default configuration file path (~/.config/mnemo/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MnemoError::Config("Cannot determine config directory".to_string()))?;
        Ok(config_dir.join("mnemo").join("config.toml"))
    }

    /// Database path with `~` expanded
    pub fn db_path(&self) -> Result<PathBuf> {
        expand_path(&self.storage.db_path)
    }

    fn validate(&self) -> Result<()> {
        if self.embedding.model.is_empty() {
            return Err(MnemoError::Config(
                "embedding.model must not be empty".to_string(),
            ));
        }
        if self.storage.db_path.as_os_str().is_empty() {
            return Err(MnemoError::Config(
                "storage.db_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| MnemoError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| MnemoError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding.model, "nomic-embed-text-v1.5");
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.storage.db_path, config.storage.db_path);
        assert_eq!(parsed.meta.schema_version, "1");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Config::load(Path::new("/nonexistent/mnemo/config.toml"));
        assert!(matches!(result, Err(MnemoError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config =
            Config::load_or_default(Some(PathBuf::from("/nonexistent/mnemo/config.toml"))).unwrap();
        assert_eq!(config.embedding.model, "nomic-embed-text-v1.5");
    }

    #[test]
    fn test_empty_model_rejected() {
        let toml_str = r#"
            [embedding]
            model = ""
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_path_home() {
        let expanded = expand_path(Path::new("~/.local/share/mnemo/mnemo.db")).unwrap();
        assert!(!expanded.starts_with("~"));
        assert!(expanded.ends_with(".local/share/mnemo/mnemo.db"));
    }

    #[test]
    fn test_expand_path_absolute_unchanged() {
        let expanded = expand_path(Path::new("/tmp/mnemo.db")).unwrap();
        assert_eq!(expanded, PathBuf::from("/tmp/mnemo.db"));
    }
}
