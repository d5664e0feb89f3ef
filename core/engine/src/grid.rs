//! FILENAME: core/engine/src/grid.rs
//! PURPOSE: Manages the collection of cells for one engine sheet.
//! CONTEXT: Sparse storage (HashMap) keyed by zero-based (row, col). Cleared
//! cells are removed rather than stored as empty, so the tracked bounds
//! always describe non-empty content.

use crate::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Grid {
    /// Sparse storage: keys are (row, col), values are Cell instances.
    pub cells: HashMap<(u32, u32), Cell>,

    /// Highest row index currently in use. Meaningless when `cells` is empty.
    pub max_row: u32,

    /// Highest column index currently in use. Meaningless when `cells` is empty.
    pub max_col: u32,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cell at the specified coordinates.
    /// Updates max_row/max_col boundaries automatically.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        if self.cells.is_empty() {
            self.max_row = row;
            self.max_col = col;
        } else {
            self.max_row = self.max_row.max(row);
            self.max_col = self.max_col.max(col);
        }
        self.cells.insert((row, col), cell);
    }

    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Removes a cell from the grid.
    /// If the cell was at a boundary (max_row or max_col), recalculates bounds.
    pub fn clear_cell(&mut self, row: u32, col: u32) {
        if self.cells.remove(&(row, col)).is_none() {
            return;
        }
        if row == self.max_row || col == self.max_col {
            self.recalculate_bounds();
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.max_row = 0;
        self.max_col = 0;
    }

    /// Recalculates max_row and max_col by scanning all cells.
    pub fn recalculate_bounds(&mut self) {
        self.max_row = self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0);
        self.max_col = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
    }

    /// (height, width) of the used area starting at (0, 0).
    pub fn extent(&self) -> (u32, u32) {
        if self.cells.is_empty() {
            (0, 0)
        } else {
            (self.max_row + 1, self.max_col + 1)
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.expression.is_some())
            .map(|(&pos, _)| pos)
    }
}
