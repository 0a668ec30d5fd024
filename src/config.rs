use std::{env, path::PathBuf, str::FromStr};

use chrono::Duration;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_dir: PathBuf,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub stream_api_key: String,
    pub stream_api_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key)
            .filter(|x| !x.is_empty())
            .ok_or(ConfigError::Missing(key));
        let ttl_days: i64 = parse_or(&lookup, "SESSION_TTL_DAYS", 7)?;
        if ttl_days <= 0 {
            return Err(ConfigError::Invalid { key: "SESSION_TTL_DAYS", value: ttl_days.to_string() });
        }
        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 5001)?,
            store_dir: lookup("STORE_DIR").map_or_else(|| PathBuf::from("store"), PathBuf::from),
            session_ttl: Duration::days(ttl_days),
            secure_cookies: parse_or(&lookup, "SECURE_COOKIES", false)?,
            stream_api_key: required("STREAM_API_KEY")?,
            stream_api_secret: required("STREAM_API_SECRET")?,
        })
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
