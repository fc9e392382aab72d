//! Operational store configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [operational]
//! set_token_expire = true
//! persisted_grants_collection = "PersistedGrants"
//!
//! [expiration]
//! enabled = true
//! delete_frequency = "60s"
//!
//! [logging]
//! level = "info"
//! ```

use grantstore_db_memory::{DocumentStoreConfig, ExpirationOptions, StorageBackend};
use serde::{Deserialize, Serialize};

use crate::options::OperationalStoreOptions;

/// Root configuration of the operational store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationalConfig {
    /// Store behaviour and collection names.
    pub operational: OperationalStoreOptions,

    /// Background purge of expired documents.
    pub expiration: ExpirationOptions,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Configuration sources could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl OperationalConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A collection name is empty
    /// - Both collection names are the same
    /// - Expiration is enabled with a zero delete frequency
    /// - The log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grants = self.operational.persisted_grants_collection.trim();
        let codes = self.operational.device_flow_codes_collection.trim();

        if grants.is_empty() || codes.is_empty() {
            return Err(ConfigError::InvalidValue(
                "collection names cannot be empty".to_string(),
            ));
        }
        if grants == codes {
            return Err(ConfigError::InvalidValue(format!(
                "persisted grants and device flow codes cannot share collection '{grants}'"
            )));
        }

        if self.expiration.enabled && self.expiration.delete_frequency.is_zero() {
            return Err(ConfigError::InvalidValue(
                "expiration.delete_frequency must be > 0 when expiration is enabled".to_string(),
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid log level: '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Document store settings derived from this configuration.
    #[must_use]
    pub fn document_store(&self) -> DocumentStoreConfig {
        DocumentStoreConfig {
            backend: StorageBackend::InMemoryPapaya,
            expiration: self.expiration.clone(),
        }
    }
}

pub mod loader {
    use super::{ConfigError, OperationalConfig};
    use config::{Config, Environment, File, Map};
    use std::path::PathBuf;

    const DEFAULT_PATH: &str = "grantstore.toml";
    const ENV_PREFIX: &str = "GRANTSTORE";

    /// Loads configuration from `path` (or `grantstore.toml` if present)
    /// with environment overrides, e.g. `GRANTSTORE__OPERATIONAL__SET_TOKEN_EXPIRE=false`.
    pub fn load_config(path: Option<&str>) -> Result<OperationalConfig, ConfigError> {
        load_config_from(path, None)
    }

    /// Like [`load_config`], reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_config_from(
        path: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> Result<OperationalConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .source(env),
        );

        let merged: OperationalConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults_validate() {
        let config = OperationalConfig::default();
        config.validate().unwrap();
        assert!(config.operational.set_token_expire);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.expiration.delete_frequency, Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_shared_collection() {
        let mut config = OperationalConfig::default();
        config.operational.device_flow_codes_collection = "PersistedGrants".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_rejects_zero_frequency() {
        let mut config = OperationalConfig::default();
        config.expiration.delete_frequency = Duration::ZERO;
        assert!(config.validate().is_err());

        config.expiration.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[operational]
set_token_expire = false
device_flow_codes_collection = "DeviceCodes"

[expiration]
delete_frequency = "5m"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = loader::load_config_from(Some(&path), Some(config::Map::new())).unwrap();

        assert!(!config.operational.set_token_expire);
        assert_eq!(config.operational.device_flow_codes_collection, "DeviceCodes");
        assert_eq!(config.operational.persisted_grants_collection, "PersistedGrants");
        assert_eq!(config.expiration.delete_frequency, Duration::from_secs(300));
        assert!(config.expiration.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[operational]\nset_token_expire = true\n").unwrap();

        let mut env = config::Map::new();
        env.insert(
            "GRANTSTORE__OPERATIONAL__SET_TOKEN_EXPIRE".to_string(),
            "false".to_string(),
        );
        env.insert("GRANTSTORE__LOGGING__LEVEL".to_string(), "warn".to_string());

        let path = file.path().to_string_lossy().to_string();
        let config = loader::load_config_from(Some(&path), Some(env)).unwrap();
        assert!(!config.operational.set_token_expire);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            loader::load_config_from(Some("/nonexistent/grantstore.toml"), Some(config::Map::new()))
                .unwrap();
        assert!(config.operational.set_token_expire);
    }

    #[test]
    fn test_document_store_config() {
        let config = OperationalConfig::default();
        let store = config.document_store();
        assert_eq!(store.backend, StorageBackend::InMemoryPapaya);
        assert_eq!(store.expiration, config.expiration);
    }
}
