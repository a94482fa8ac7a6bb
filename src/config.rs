/// Process configuration for the function host
///
/// Read once at startup from the environment (after `.env` is loaded) and
/// overridden by CLI flags. Never mutated afterwards.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::response::DEFAULT_TTL;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:9443";

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionConfig {
    /// Address the HTTP host listens on
    pub address: SocketAddr,
    /// Cache hint attached to every response
    pub ttl: Duration,
    /// Log at debug level unless RUST_LOG says otherwise
    pub debug: bool,
}

impl FunctionConfig {
    /// Load configuration from `FUNCTION_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("FUNCTION_ADDRESS")
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let address: SocketAddr = address.parse().map_err(|_| ConfigError::InvalidValue {
            key: "FUNCTION_ADDRESS",
            value: address.clone(),
        })?;

        let ttl = match lookup("FUNCTION_TTL_SECONDS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "FUNCTION_TTL_SECONDS",
                value: raw.clone(),
            })?),
            None => DEFAULT_TTL,
        };

        let debug = match lookup("FUNCTION_DEBUG") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                key: "FUNCTION_DEBUG",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self { address, ttl, debug })
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([0, 0, 0, 0], 9443)),
            ttl: DEFAULT_TTL,
            debug: false,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Error type for configuration loading
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
