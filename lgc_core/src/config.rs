//! Configuration file support for Lazy Gains Club.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lgc/config.toml`.

use crate::{Error, Result, Sex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Import engine parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Records per upsert call during commit
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// The local user's profile
///
/// Circumferences and height share one linear unit (inches in practice).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default)]
    pub sex: Option<Sex>,

    #[serde(default)]
    pub height: Option<f64>,

    #[serde(default)]
    pub neck: Option<f64>,

    #[serde(default)]
    pub hips: Option<f64>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            sex: None,
            height: None,
            neck: None,
            hips: None,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("lgc")
}

fn default_batch_size() -> usize {
    50
}

fn default_user_id() -> String {
    "local".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the import engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            return Err(Error::Config("import.batch_size must be at least 1".into()));
        }
        if self.profile.user_id.trim().is_empty() {
            return Err(Error::Config("profile.user_id must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("lgc").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.import.batch_size, 50);
        assert_eq!(config.profile.user_id, "local");
        assert!(config.profile.sex.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[profile]
user_id = "alex"
sex = "female"
height = 66.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.profile.user_id, "alex");
        assert_eq!(config.profile.sex, Some(Sex::Female));
        assert_eq!(config.profile.height, Some(66.0));
        assert_eq!(config.import.batch_size, 50); // default
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.import.batch_size = 10;
        config.profile.neck = Some(15.5);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.import.batch_size, 10);
        assert_eq!(loaded.profile.neck, Some(15.5));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[import]\nbatch_size = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
