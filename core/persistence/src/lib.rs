//! FILENAME: core/persistence/src/lib.rs
//! Document model and file persistence.
//!
//! A `Workbook` is the document representation of a spreadsheet: ordered
//! sheets of cells, each either a literal or a formula with a cached result.
//! Cell keys are 1-based (row, col), matching the addresses agents use.
//! Loading and saving go through XLSX (calamine reads, rust_xlsxwriter writes).

mod dates;
mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use dates::{date_to_serial, format_iso_datetime, parse_iso_datetime, serial_to_date};
pub use error::PersistenceError;
pub use xlsx_reader::load_xlsx;
pub use xlsx_writer::save_xlsx;

use chrono::NaiveDateTime;
use engine::cell::CellValue;
use engine::coord::{parse_reference, AddressError};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

// ============================================================================
// WORKBOOK
// ============================================================================

#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// A new document with a single empty `Sheet1`.
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME.to_string())],
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Zero-based position of the named sheet.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Appends an empty sheet. The caller guarantees the name is unused.
    pub fn add_sheet(&mut self, name: String) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SHEET
// ============================================================================

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Keys are 1-based (row, col).
    pub cells: HashMap<(u32, u32), SavedCell>,
}

impl Sheet {
    pub fn new(name: String) -> Self {
        Self {
            name,
            cells: HashMap::new(),
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&SavedCell> {
        self.cells.get(&(row, col))
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut SavedCell> {
        self.cells.get_mut(&(row, col))
    }

    /// Stores a cell. Empty cells are kept as entries and count toward the
    /// declared extent.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: SavedCell) {
        self.cells.insert((row, col), cell);
    }

    /// Cell lookup by A1-style address.
    pub fn cell_at(&self, address: &str) -> Result<Option<&SavedCell>, AddressError> {
        let address = parse_reference(address)?;
        Ok(self.cell(address.row, address.col))
    }

    pub fn set_cell_at(&mut self, address: &str, cell: SavedCell) -> Result<(), AddressError> {
        let address = parse_reference(address)?;
        self.set_cell(address.row, address.col, cell);
        Ok(())
    }

    /// Declared (rows, columns): the highest row and column holding any entry.
    pub fn dimensions(&self) -> (u32, u32) {
        extent(self.cells.keys())
    }

    /// Actual (rows, columns): only entries with a value or a formula count.
    pub fn actual_dimensions(&self) -> (u32, u32) {
        extent(
            self.cells
                .iter()
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(key, _)| key),
        )
    }

    pub fn formula_cells(&self) -> impl Iterator<Item = ((u32, u32), &SavedCell)> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.is_formula())
            .map(|(key, cell)| (*key, cell))
    }
}

fn extent<'a>(keys: impl Iterator<Item = &'a (u32, u32)>) -> (u32, u32) {
    keys.fold((0, 0), |(rows, cols), (r, c)| (rows.max(*r), cols.max(*c)))
}

// ============================================================================
// SAVED CELL
// ============================================================================

/// A document cell. For formula cells `value` is the cached last result.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCell {
    pub value: SavedCellValue,
    /// Formula text without the leading '='.
    pub formula: Option<String>,
}

impl SavedCell {
    pub fn empty() -> Self {
        Self {
            value: SavedCellValue::Empty,
            formula: None,
        }
    }

    pub fn literal(value: SavedCellValue) -> Self {
        Self {
            value,
            formula: None,
        }
    }

    /// Formula cell with an empty cache. A leading '=' is stripped.
    pub fn formula(text: &str) -> Self {
        Self {
            value: SavedCellValue::Empty,
            formula: Some(text.strip_prefix('=').unwrap_or(text).to_string()),
        }
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.formula.is_none() && self.value == SavedCellValue::Empty
    }

    /// Formula text with the '=' marker restored.
    pub fn formula_text(&self) -> Option<String> {
        self.formula.as_ref().map(|f| format!("={}", f))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SavedCellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
    /// Error literal, kept as its display text (e.g. "#N/A").
    Error(String),
}

impl SavedCellValue {
    pub fn from_value(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => SavedCellValue::Empty,
            CellValue::Number(n) => SavedCellValue::Number(*n),
            CellValue::Text(s) => SavedCellValue::Text(s.clone()),
            CellValue::Boolean(b) => SavedCellValue::Boolean(*b),
            CellValue::Error(e) => SavedCellValue::Error(e.to_string()),
        }
    }
}

impl fmt::Display for SavedCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavedCellValue::Empty => Ok(()),
            SavedCellValue::Number(n) => f.write_str(&CellValue::Number(*n).to_string()),
            SavedCellValue::Text(s) => f.write_str(s),
            SavedCellValue::Boolean(true) => f.write_str("TRUE"),
            SavedCellValue::Boolean(false) => f.write_str("FALSE"),
            SavedCellValue::DateTime(dt) => f.write_str(&format_iso_datetime(dt)),
            SavedCellValue::Error(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> SavedCell {
        SavedCell::literal(SavedCellValue::Number(n))
    }

    #[test]
    fn new_workbook_has_one_sheet() {
        let workbook = Workbook::new();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
        assert_eq!(workbook.sheets[0].dimensions(), (0, 0));
    }

    #[test]
    fn declared_and_actual_extents_differ_on_empty_entries() {
        let mut sheet = Sheet::new("Data".to_string());
        sheet.set_cell(2, 3, number(1.0));
        sheet.set_cell(10, 1, SavedCell::empty());
        sheet.set_cell(1, 6, SavedCell::formula("=A1"));

        assert_eq!(sheet.dimensions(), (10, 6));
        assert_eq!(sheet.actual_dimensions(), (2, 6));
    }

    #[test]
    fn address_access() {
        let mut sheet = Sheet::new("Data".to_string());
        sheet.set_cell_at("b3", number(7.0)).unwrap();
        assert_eq!(sheet.cell(3, 2), Some(&number(7.0)));
        assert_eq!(sheet.cell_at("B3").unwrap(), Some(&number(7.0)));
        assert!(sheet.cell_at("3B").is_err());
    }

    #[test]
    fn formula_marker_is_stripped_and_restored() {
        let cell = SavedCell::formula("=SUM(A1:A2)");
        assert_eq!(cell.formula.as_deref(), Some("SUM(A1:A2)"));
        assert_eq!(cell.formula_text().as_deref(), Some("=SUM(A1:A2)"));
        assert!(!cell.is_empty());
    }
}
