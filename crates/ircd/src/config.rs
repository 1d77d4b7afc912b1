use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::InternalIrcError;

/// File-backed server settings. Every field has a default so a config file
/// is optional and may be partial.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    /// Seconds of inactivity before a client is disconnected.
    pub client_time_to_live_secs: u64,
    /// Probe idle clients with a server PING at half the deadline.
    pub ping_at_half_time: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: "0.0.0.0".to_owned(),
            client_time_to_live_secs: 40,
            ping_at_half_time: true,
        }
    }
}

impl Config {
    /// Loads and parses the TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InternalIrcError> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| InternalIrcError::Config(e.to_string()))?;
        Ok(config)
    }
}

/// Everything the listener needs to start: the two mandatory command line
/// arguments plus the optional file configuration.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub port: u16,
    pub password: String,
    pub config: Config,
}
