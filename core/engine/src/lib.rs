//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the calculation engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! Callers outside this crate speak 1-based addresses (`coord`); the engine
//! itself is zero-based.

pub mod calc;
pub mod cell;
pub mod config;
pub mod coord;
pub mod error;
pub mod evaluator;
mod functions;
pub mod grid;

// Re-export commonly used types at the crate root
pub use calc::{CalcEngine, EngineSheet, SheetDimensions, SheetId};
pub use cell::{Cell, CellContent, CellError, CellValue};
pub use config::EngineConfig;
pub use coord::{
    col_to_index, format_address, format_column, parse_range, parse_reference, AddressError,
    CellAddress, CellCoord, CellRange,
};
pub use error::EngineError;
pub use evaluator::{EvalResult, Evaluator};
pub use grid::Grid;
