use crate::engine::OdometerPolicy;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub odometer_policy: OdometerPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let odometer_policy = match env_map.get("ODOMETER_POLICY") {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<OdometerPolicy>()
                .map_err(|reason| ConfigError::InvalidValue("ODOMETER_POLICY".to_string(), reason))?,
            None => OdometerPolicy::default(),
        };

        Ok(Config {
            port,
            database_path,
            odometer_policy,
        })
    }
}
