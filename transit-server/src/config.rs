//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::planner::PlannerConfig;

/// Directory holding the timetable dataset, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "CapeTownTransitData";

pub const DEFAULT_BIND: &str = "127.0.0.1:4567";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Everything the binary needs to start serving.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub planner: PlannerConfig,
}

impl ServerConfig {
    /// Read `TRANSIT_DATA_DIR` and `TRANSIT_BIND`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ServerConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = value("TRANSIT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let bind_raw = value("TRANSIT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "TRANSIT_BIND",
                value: bind_raw.clone(),
            })?;

        Ok(Self {
            data_dir,
            bind,
            planner: PlannerConfig::default(),
        })
    }
}
