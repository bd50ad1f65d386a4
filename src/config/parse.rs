use super::types::Config;
use crate::config::{expand_env_vars, expand_tilde};
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML in '{path}': {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(&yaml_string);

    let mut config: Config = serde_yaml::from_str(&yaml_string).map_err(|e| {
        ConfigError::YamlParse {
            path: path.display().to_string(),
            source: e,
        }
    })?;

    if let Some(dir) = config.web.client_dir.take() {
        config.web.client_dir = Some(expand_tilde(&dir));
    }

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.web.listen.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "web.listen '{}' is not a valid socket address",
            config.web.listen
        )));
    }

    if config.polling.interval.is_zero() {
        return Err(ConfigError::Validation(
            "polling.interval must be non-zero".to_string(),
        ));
    }

    if config.polling.max_wait.is_zero() {
        return Err(ConfigError::Validation(
            "polling.max_wait must be non-zero".to_string(),
        ));
    }

    if config.polling.interval > config.polling.max_wait {
        return Err(ConfigError::Validation(format!(
            "polling.interval ({:?}) must not exceed polling.max_wait ({:?})",
            config.polling.interval, config.polling.max_wait
        )));
    }

    if config.viewer.url_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "viewer.url_prefix must not be empty".to_string(),
        ));
    }

    Ok(())
}
