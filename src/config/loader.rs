//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{GateConfig, PolicyConfig};
use crate::config::validation::{
    normalize_config, normalize_legacy_policy, validate_config, ValidationError,
};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a file.
///
/// `.json` files are read as the legacy flat policy document; anything else
/// is parsed as TOML.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let mut config = if is_json {
        let mut policy: PolicyConfig = serde_json::from_str(&content)?;
        normalize_legacy_policy(&mut policy);
        GateConfig {
            policy,
            ..GateConfig::default()
        }
    } else {
        toml::from_str(&content)?
    };

    normalize_config(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

impl ConfigError {
    /// Whether the safe defaults may stand in for this file.
    ///
    /// Only an absent or unparseable file qualifies; a file that fails
    /// validation is a startup error.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, ConfigError::Validation(_))
    }
}

/// Load configuration, falling back to the safe defaults when the file is
/// missing or unparseable.
///
/// The fallback reason is handed back so it can be logged once tracing is
/// up. Validation failures are returned as errors.
pub fn load_or_default(path: &Path) -> Result<(GateConfig, Option<ConfigError>), ConfigError> {
    match load_config(path) {
        Ok(config) => Ok((config, None)),
        Err(e) if e.allows_fallback() => Ok((GateConfig::default(), Some(e))),
        Err(e) => Err(e),
    }
}

/// Log why the fallback defaults are in effect.
pub fn report_fallback(path: &Path, error: &ConfigError) {
    match error {
        ConfigError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Config file not found, using fallback defaults");
        }
        e => {
            tracing::error!(path = %path.display(), error = %e, "Config unreadable, using fallback defaults");
        }
    }
}
