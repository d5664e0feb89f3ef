//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - the computed result, ready to be written into a sheet.

use engine::CellValue;
use serde::{Deserialize, Serialize};

/// One output row: the group's key segments, then one number per value field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotView {
    /// Grouping field names followed by "<AGG>(<field>)" labels.
    pub header: Vec<String>,
    /// Groups in first-seen order.
    pub rows: Vec<PivotRow>,
}

impl PivotView {
    /// Row-major cell grid: header row first. Empty key segments become
    /// empty cells.
    pub fn to_grid(&self) -> Vec<Vec<CellValue>> {
        let header = self
            .header
            .iter()
            .map(|h| CellValue::Text(h.clone()))
            .collect();

        std::iter::once(header)
            .chain(self.rows.iter().map(|row| {
                row.labels
                    .iter()
                    .map(|label| {
                        if label.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(label.clone())
                        }
                    })
                    .chain(row.values.iter().map(|v| CellValue::Number(*v)))
                    .collect()
            }))
            .collect()
    }

    /// (rows, columns) of `to_grid()`.
    pub fn size(&self) -> (usize, usize) {
        (self.rows.len() + 1, self.header.len())
    }
}
