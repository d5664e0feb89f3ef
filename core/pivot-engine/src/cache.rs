//! FILENAME: core/pivot-engine/src/cache.rs
//! Pivot Cache - the source data snapshot a pivot is computed from.
//!
//! Holds the field vocabulary (header labels) and one record per data row,
//! already resolved to calculated values. Also home to the per-group
//! aggregate accumulator.

use crate::definition::{AggregationType, FieldIndex};
use engine::CellValue;
use serde::{Deserialize, Serialize};

// ============================================================================
// CACHE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PivotCache {
    pub field_names: Vec<String>,
    /// One entry per data row. Records may be shorter than `field_names`;
    /// missing trailing values are treated as empty.
    pub records: Vec<Vec<CellValue>>,
}

impl PivotCache {
    /// Builds the cache from a header row and the data rows beneath it.
    /// Empty header cells are named "Column<N>" (N = 1-based offset).
    pub fn new(header: &[CellValue], records: Vec<Vec<CellValue>>) -> Self {
        let field_names = header
            .iter()
            .enumerate()
            .map(|(i, value)| match value {
                CellValue::Empty => format!("Column{}", i + 1),
                other => other.to_string(),
            })
            .collect();

        PivotCache {
            field_names,
            records,
        }
    }

    /// First field with the given header label.
    pub fn field_index(&self, name: &str) -> Option<FieldIndex> {
        self.field_names.iter().position(|f| f == name)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Value of a field in a record. Absent values read as empty.
    pub fn record_value(&self, record: usize, field: Option<FieldIndex>) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        field
            .and_then(|f| self.records.get(record)?.get(f))
            .unwrap_or(EMPTY)
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    /// Rows seen, numeric or not.
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    pub fn add(&mut self, value: &CellValue) {
        match value {
            CellValue::Number(n) => self.add_number(*n),
            _ => self.add_non_number(),
        }
    }

    /// Average, min and max of a group with no numbers are 0.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Sum => self.sum,
            AggregationType::Count => self.count as f64,
            AggregationType::Average => {
                if self.count_numbers == 0 {
                    0.0
                } else {
                    self.sum / self.count_numbers as f64
                }
            }
            AggregationType::Min => self.min.unwrap_or(0.0),
            AggregationType::Max => self.max.unwrap_or(0.0),
        }
    }
}
