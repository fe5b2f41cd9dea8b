//! Admin tool configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bracket_engine::config::{ConfigError, EngineConfig};
use bracket_engine::db::DatabaseConfig;

/// Complete configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Default series formats
    pub engine: EngineConfig,
}

impl AdminConfig {
    /// Load configuration from environment variables
    ///
    /// `database_url_override` comes from `--db-url` and wins over `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(database_url_override: Option<String>) -> Result<Self, ConfigError> {
        let database = match database_url_override {
            Some(url) => DatabaseConfig::with_url(url),
            None => DatabaseConfig::from_env()?,
        };
        let config = Self {
            database,
            engine: EngineConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: "Cannot exceed DB_MAX_CONNECTIONS".to_string(),
            });
        }

        self.engine.validate()
    }
}
