//! # acx-config
//!
//! Layered configuration loading for acx using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ACX_*` prefix, `__` as separator)
//! 2. An explicit file passed with `--config`
//! 3. Project-level `.acx/config.toml`
//! 4. User-level `~/.config/acx/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! `ACX_STORAGE__PACKAGES_DIR` -> `storage.packages_dir`,
//! `ACX_IMPORT__OVERWRITE_EXISTING` -> `import.overwrite_existing`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use acx_config::AcxConfig;
//!
//! let config = AcxConfig::load_with_dotenv(None).expect("config");
//! println!("packages live in {}", config.storage.packages_dir.display());
//! ```

mod database;
mod error;
mod import;
mod packaging;
mod storage;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use import::ImportConfig;
pub use packaging::PackagingConfig;
pub use storage::StorageConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AcxConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub packaging: PackagingConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl AcxConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.filter(|p| !p.exists()) {
            return Err(ConfigError::InvalidValue {
                field: "config".into(),
                reason: format!("file {} does not exist", path.display()),
            });
        }
        let config: Self = Self::figment(explicit).extract()?;
        config.check()?;
        Ok(config)
    }

    /// Load `.env` from the current directory, then every other source.
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer more providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".acx/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("ACX_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("acx").join("config.toml"))
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.storage.packages_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.packages_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.storage.temp_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.temp_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acx_core::enums::Compression;

    #[test]
    fn default_config_loads() {
        let config = AcxConfig::default();
        assert_eq!(config.packaging.compression, Compression::Default);
        assert!(config.import.modify_slugs_on_conflict);
        assert!(!config.database.is_in_memory());
    }

    #[test]
    fn empty_packages_dir_is_rejected() {
        let mut config = AcxConfig::default();
        config.storage.packages_dir = PathBuf::new();
        assert!(matches!(
            config.check(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "storage.packages_dir"
        ));
    }
}
