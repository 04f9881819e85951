//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary). Invalid values fall back to the defaults with a warning.
//!
//! | Variable                     | Default  |
//! |------------------------------|----------|
//! | `SHEETJSON_PORT`             | 3000     |
//! | `SHEETJSON_MAX_UPLOAD_BYTES` | 50 MiB   |
//! | `SHEETJSON_CACHE_CAPACITY`   | 16       |

use std::str::FromStr;

use crate::api::logs::log_warning;
use crate::cache::DEFAULT_CAPACITY;

pub const DEFAULT_PORT: u16 = 3000;

/// 50 MB limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const ENV_PORT: &str = "SHEETJSON_PORT";
pub const ENV_MAX_UPLOAD_BYTES: &str = "SHEETJSON_MAX_UPLOAD_BYTES";
pub const ENV_CACHE_CAPACITY: &str = "SHEETJSON_CACHE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Workbooks kept in the session cache.
    pub cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, ENV_PORT, defaults.port),
            max_upload_bytes: parse_or(&lookup, ENV_MAX_UPLOAD_BYTES, defaults.max_upload_bytes),
            cache_capacity: parse_or(&lookup, ENV_CACHE_CAPACITY, defaults.cache_capacity).max(1),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log_warning(format!("{}='{}' is invalid, using {}", key, raw, default));
                default
            }
        },
    }
}
