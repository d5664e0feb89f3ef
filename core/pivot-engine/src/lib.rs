//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot Table subsystem.
//!
//! This crate provides the pivot aggregation as a standalone module,
//! separate from the calculation engine. It depends on `engine` only for
//! the shared `CellValue` type.
//!
//! Layers:
//! - `definition`: Serializable request (row fields, value fields)
//! - `cache`: Source snapshot and aggregate accumulators
//! - `view`: Computed output grid
//! - `engine`: Grouping and aggregation

pub mod cache;
pub mod definition;
pub mod engine;
pub mod view;

pub use cache::{AggregateAccumulator, PivotCache};
pub use definition::{AggregationType, FieldIndex, PivotDefinition, UnknownAggregation, ValueField};
pub use engine::{calculate_pivot, PivotOutput};
pub use view::{PivotRow, PivotView};
