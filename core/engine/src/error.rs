//! FILENAME: core/engine/src/error.rs
//! PURPOSE: Error type for calculation-engine operations.

use crate::calc::SheetId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine sheet {0} does not exist")]
    SheetNotFound(SheetId),

    #[error("Engine already has a sheet named '{0}'")]
    DuplicateSheet(String),

    #[error("Sheet name must not be empty")]
    EmptySheetName,

    #[error("Cell ({row}, {col}) is outside the engine limits of {max_rows} rows x {max_columns} columns")]
    OutOfBounds {
        row: u32,
        col: u32,
        max_rows: u32,
        max_columns: u32,
    },
}
