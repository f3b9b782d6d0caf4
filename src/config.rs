//! Runtime configuration.
//!
//! Values come from `QUIZ_FORMS_*` environment variables, falling back to
//! defaults; the CLI may override them afterwards.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::DEFAULT_PORT;
use crate::services::DEFAULT_SESSION_TTL;

pub const HOST_VAR: &str = "QUIZ_FORMS_HOST";
pub const PORT_VAR: &str = "QUIZ_FORMS_PORT";
pub const DATA_DIR_VAR: &str = "QUIZ_FORMS_DATA_DIR";
pub const SEED_VAR: &str = "QUIZ_FORMS_SEED";
pub const SESSION_TTL_VAR: &str = "QUIZ_FORMS_SESSION_TTL_SECS";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error)]
#[error("Invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Seed sample users and forms into an empty data directory.
    pub seed: bool,
    /// Lifetime of a login session.
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            seed: true,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
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
        let defaults = Self::default();
        Ok(Self {
            host: try_load(&lookup, HOST_VAR, defaults.host)?,
            port: try_load(&lookup, PORT_VAR, defaults.port)?,
            data_dir: try_load(&lookup, DATA_DIR_VAR, defaults.data_dir)?,
            seed: load_flag(&lookup, SEED_VAR, defaults.seed)?,
            session_ttl: Duration::from_secs(try_load(
                &lookup,
                SESSION_TTL_VAR,
                defaults.session_ttl.as_secs(),
            )?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }
        }),
        None => {
            debug!("{key} not set, using default");
            Ok(default)
        }
    }
}

fn load_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            key: key.to_string(),
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
