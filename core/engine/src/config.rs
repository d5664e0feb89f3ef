//! FILENAME: core/engine/src/config.rs
//! PURPOSE: Construction-time limits for a calculation engine instance.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROWS: u32 = 1_048_576;
pub const DEFAULT_MAX_COLUMNS: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub max_rows: u32,
    pub max_columns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_rows: DEFAULT_MAX_ROWS,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}
