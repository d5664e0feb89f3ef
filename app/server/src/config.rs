//! FILENAME: app/server/src/config.rs
// PURPOSE: Server configuration loaded once at startup.
// CONTEXT: `SHEET_SERVER_CONFIG` names an optional JSON file; `SHEET_SERVER_LOG`
//          overrides the log file path. Missing keys take their defaults.

use crate::error::ConfigError;
use crate::logging::LogLevel;
use engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_ENV_VAR: &str = "SHEET_SERVER_CONFIG";
pub const LOG_ENV_VAR: &str = "SHEET_SERVER_LOG";
pub const DEFAULT_PIVOT_SHEET_PREFIX: &str = "Pivot_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub log_file: Option<PathBuf>,
    pub log_level: LogLevel,
    pub engine: EngineConfig,
    /// Prefix of synthesized pivot destination sheet names.
    pub pivot_sheet_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            log_file: None,
            log_level: LogLevel::default(),
            engine: EngineConfig::default(),
            pivot_sheet_prefix: DEFAULT_PIVOT_SHEET_PREFIX.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads the configuration named by the environment, falling back to
    /// defaults when no file is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_json_str(&text)?
            }
            None => ServerConfig::default(),
        };

        if let Some(log) = std::env::var_os(LOG_ENV_VAR) {
            config.log_file = Some(PathBuf::from(log));
        }

        Ok(config)
    }
}
