//! FILENAME: app/server/src/error.rs
// PURPOSE: Error taxonomy surfaced by every tool call.
// CONTEXT: `code()` is the stable machine-readable kind; Display is the
//          human-readable message.

use engine::{AddressError, EngineError};
use persistence::PersistenceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Workbook '{0}' is not open")]
    WorkbookNotFound(String),

    #[error("Sheet {0} does not exist")]
    SheetNotFound(String),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("{0}")]
    InvalidRange(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Cannot read workbook file: {0}")]
    FileFormatError(String),

    #[error("No file path given and the workbook has never been saved or opened from a file")]
    MissingFilePath,

    #[error("A sheet named '{0}' already exists")]
    SheetAlreadyExists(String),

    #[error("Cannot delete '{0}': a workbook must keep at least one sheet")]
    LastSheet(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::WorkbookNotFound(_) => "WorkbookNotFound",
            ToolError::SheetNotFound(_) => "SheetNotFound",
            ToolError::InvalidAddress(_) => "InvalidAddress",
            ToolError::InvalidRange(_) => "InvalidRange",
            ToolError::FileNotFound(_) => "FileNotFound",
            ToolError::FileFormatError(_) => "FileFormatError",
            ToolError::MissingFilePath => "MissingFilePath",
            ToolError::SheetAlreadyExists(_) => "SheetAlreadyExists",
            ToolError::LastSheet(_) => "LastSheet",
            ToolError::InvalidArgument(_) => "InvalidArgument",
            ToolError::Io(_) => "Io",
            ToolError::InvalidRequest(_) => "InvalidRequest",
        }
    }
}

impl From<AddressError> for ToolError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidAddress(_) => ToolError::InvalidAddress(err.to_string()),
            AddressError::InvalidRange(_) => ToolError::InvalidRange(err.to_string()),
        }
    }
}

impl From<PersistenceError> for ToolError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::FileNotFound(path) => ToolError::FileNotFound(path.display().to_string()),
            PersistenceError::XlsxRead(e) => ToolError::FileFormatError(e.to_string()),
            PersistenceError::InvalidFormat(msg) => ToolError::FileFormatError(msg),
            PersistenceError::Io(e) => ToolError::Io(e.to_string()),
            PersistenceError::XlsxWrite(e) => ToolError::Io(e.to_string()),
        }
    }
}

impl From<EngineError> for ToolError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SheetNotFound(id) => ToolError::SheetNotFound(format!("with engine id {}", id)),
            EngineError::DuplicateSheet(name) => ToolError::SheetAlreadyExists(name),
            EngineError::EmptySheetName | EngineError::OutOfBounds { .. } => {
                ToolError::InvalidArgument(err.to_string())
            }
        }
    }
}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_errors_keep_their_kind() {
        let err: ToolError = engine::parse_reference("1A").unwrap_err().into();
        assert_eq!(err.code(), "InvalidAddress");
        let err: ToolError = engine::parse_range("A1").unwrap_err().into();
        assert_eq!(err.code(), "InvalidRange");
    }

    #[test]
    fn test_engine_errors_map_to_taxonomy() {
        let err: ToolError = EngineError::DuplicateSheet("Data".to_string()).into();
        assert_eq!(err, ToolError::SheetAlreadyExists("Data".to_string()));
        let err: ToolError = EngineError::OutOfBounds {
            row: 9,
            col: 0,
            max_rows: 5,
            max_columns: 5,
        }
        .into();
        assert_eq!(err.code(), "InvalidArgument");
    }

    #[test]
    fn test_missing_file_maps_to_file_not_found() {
        let err: ToolError = PersistenceError::FileNotFound(PathBuf::from("/nope.xlsx")).into();
        assert_eq!(err.code(), "FileNotFound");
        assert!(err.to_string().contains("nope.xlsx"));
    }
}
