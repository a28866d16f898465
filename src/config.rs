//! Process configuration read from the environment (and `.env`, when present).

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_POOL_SIZE: usize = 8;
/// Ten years; keeps `iat + ttl` far from the timestamp limits.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366 * 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// HMAC key used to sign and verify bearer tokens.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub pool_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let bind_addr = parse_or(&lookup, "BIND_ADDR", || {
            SocketAddr::from_str(DEFAULT_BIND_ADDR).map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_owned(),
            })
        })?;
        let ttl_hours: i64 = parse_or(&lookup, "TOKEN_TTL_HOURS", || Ok(DEFAULT_TOKEN_TTL_HOURS))?;
        let token_ttl = Some(ttl_hours)
            .filter(|hours| *hours > 0 && *hours <= MAX_TOKEN_TTL_HOURS)
            .and_then(Duration::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;
        let pool_size: usize = parse_or(&lookup, "DATABASE_POOL_SIZE", || Ok(DEFAULT_POOL_SIZE))?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_POOL_SIZE",
                value: "0".to_owned(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            token_ttl,
            pool_size,
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, key: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default(),
    }
}
