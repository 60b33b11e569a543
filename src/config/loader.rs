//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{Secret, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: '{}'", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Build the runtime configuration: optional file, then environment overlay,
/// then validation of the merged result.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` resolves a variable name to its value; the process environment in
/// production, a map in tests.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("DATABASE_HOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("DATABASE_PORT") {
        config.database.port = port.parse().map_err(|_| ConfigError::Env {
            var: "DATABASE_PORT",
            value: port.clone(),
        })?;
    }
    if let Some(name) = lookup("DATABASE_NAME") {
        config.database.name = name;
    }
    if let Some(user) = lookup("DATABASE_USER") {
        config.database.user = user;
    }
    if let Some(password) = lookup("DATABASE_PASSWORD") {
        config.database.password = Some(Secret::new(password));
    }
    if let Some(url) = lookup("REDIS_URL") {
        config.counter_store.url = url;
    }

    Ok(config)
}
