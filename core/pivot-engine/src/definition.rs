//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Table Definition - The serializable request.
//!
//! Describes WHAT to compute: which header fields group the rows and which
//! fields are aggregated, and how. Fields are referenced by header label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index into the source data columns (0-based).
pub type FieldIndex = usize;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
/// Deserializes case-insensitively ("sum", "SUM", "Sum").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AggregationType {
    Sum,
    Count,
    Average,
    Min,
    Max,
}

impl AggregationType {
    /// Uppercase label used in result headers, e.g. "SUM".
    pub fn label(self) -> &'static str {
        match self {
            AggregationType::Sum => "SUM",
            AggregationType::Count => "COUNT",
            AggregationType::Average => "AVERAGE",
            AggregationType::Min => "MIN",
            AggregationType::Max => "MAX",
        }
    }
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAggregation(pub String);

impl fmt::Display for UnknownAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown aggregation '{}': expected one of sum, count, average, min, max",
            self.0
        )
    }
}

impl std::error::Error for UnknownAggregation {}

impl FromStr for AggregationType {
    type Err = UnknownAggregation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationType::Sum),
            "count" => Ok(AggregationType::Count),
            "average" => Ok(AggregationType::Average),
            "min" => Ok(AggregationType::Min),
            "max" => Ok(AggregationType::Max),
            _ => Err(UnknownAggregation(s.to_string())),
        }
    }
}

impl TryFrom<String> for AggregationType {
    type Error = UnknownAggregation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// A field to aggregate and the function to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueField {
    pub field: String,
    pub aggregation: AggregationType,
}

impl ValueField {
    pub fn new(field: impl Into<String>, aggregation: AggregationType) -> Self {
        ValueField {
            field: field.into(),
            aggregation,
        }
    }

    /// Result column header, e.g. "SUM(Price)".
    pub fn header(&self) -> String {
        format!("{}({})", self.aggregation.label(), self.field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotDefinition {
    /// Header labels whose values form the group key, in key order.
    pub row_fields: Vec<String>,
    pub value_fields: Vec<ValueField>,
}

impl PivotDefinition {
    pub fn new(row_fields: Vec<String>, value_fields: Vec<ValueField>) -> Self {
        PivotDefinition {
            row_fields,
            value_fields,
        }
    }
}
