use std::env;

use thiserror::Error;

use crate::blockchain::{DEFAULT_DIFFICULTY_BITS, MAX_DIFFICULTY_BITS};

/// Runtime settings, read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty_bits: u32,
    /// Nonce budget per mined block; `None` searches the whole nonce space.
    pub max_nonce_attempts: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let difficulty_bits = match lookup("DIFFICULTY_BITS") {
            None => DEFAULT_DIFFICULTY_BITS,
            Some(value) => match value.trim().parse::<u32>() {
                Ok(bits) if bits <= MAX_DIFFICULTY_BITS => bits,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DIFFICULTY_BITS",
                        value,
                    });
                }
            },
        };

        let max_nonce_attempts = match lookup("MAX_NONCE_ATTEMPTS") {
            None => None,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(attempts) => Some(attempts),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_NONCE_ATTEMPTS",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            host,
            port,
            difficulty_bits,
            max_nonce_attempts,
        })
    }
}
