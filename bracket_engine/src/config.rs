//! Engine configuration.
//!
//! Default series formats for each kind of match, overridable from the environment.

use crate::bracket::MatchFormat;
use std::str::FromStr;
use thiserror::Error;

/// Series formats used when generating matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Single elimination and double elimination bracket matches
    pub bracket_format: MatchFormat,
    /// Group stage matches. An even series permits a draw.
    pub group_stage_format: MatchFormat,
    /// Swiss round matches
    pub swiss_format: MatchFormat,
    /// Double elimination grand final
    pub grand_final_format: MatchFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bracket_format: MatchFormat::best_of(3),
            group_stage_format: MatchFormat::best_of(2),
            swiss_format: MatchFormat::best_of(1),
            grand_final_format: MatchFormat::best_of(5),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// - `BRACKET_BEST_OF` (default: 3)
    /// - `GROUP_STAGE_BEST_OF` (default: 2)
    /// - `SWISS_BEST_OF` (default: 1)
    /// - `GRAND_FINAL_BEST_OF` (default: 5)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a value is not a number or is zero
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            bracket_format: best_of_env("BRACKET_BEST_OF", defaults.bracket_format)?,
            group_stage_format: best_of_env("GROUP_STAGE_BEST_OF", defaults.group_stage_format)?,
            swiss_format: best_of_env("SWISS_BEST_OF", defaults.swiss_format)?,
            grand_final_format: best_of_env("GRAND_FINAL_BEST_OF", defaults.grand_final_format)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let formats = [
            ("BRACKET_BEST_OF", self.bracket_format),
            ("GROUP_STAGE_BEST_OF", self.group_stage_format),
            ("SWISS_BEST_OF", self.swiss_format),
            ("GRAND_FINAL_BEST_OF", self.grand_final_format),
        ];
        for (var, format) in formats {
            if format.best_of == 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Series length must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn best_of_env(var: &str, default: MatchFormat) -> Result<MatchFormat, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u8>()
            .map(MatchFormat::best_of)
            .map_err(|e| ConfigError::Invalid {
                var: var.to_string(),
                reason: format!("'{raw}' is not a series length: {e}"),
            }),
        Err(_) => Ok(default),
    }
}

/// Parse environment variable or return default value
pub fn parse_env_or<T: FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}
