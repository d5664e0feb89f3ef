//! FILENAME: core/persistence/src/xlsx_reader.rs
//! PURPOSE: Loads an .xlsx file into the document model.
//! CONTEXT: calamine reports positions relative to each range's start, so
//! every coordinate is offset by `range.start()` before being stored 1-based.

use crate::dates::serial_to_date;
use crate::{PersistenceError, SavedCell, SavedCellValue, Sheet, Workbook};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::Path;

pub fn load_xlsx(path: &Path) -> Result<Workbook, PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::FileNotFound(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let values = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;
        // Formulas are read once per sheet. A sheet without any yields an empty range.
        let formulas = workbook
            .worksheet_formula(sheet_name)
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        let mut sheet = Sheet::new(sheet_name.clone());
        read_values(&mut sheet, &values);
        read_formulas(&mut sheet, &formulas);
        sheets.push(sheet);
    }

    Ok(Workbook { sheets })
}

fn read_values(sheet: &mut Sheet, range: &Range<Data>) {
    let Some((start_row, start_col)) = range.start() else {
        return;
    };

    for (row, col, data) in range.used_cells() {
        let value = match data {
            Data::Empty => continue,
            Data::String(s) => SavedCellValue::Text(s.clone()),
            Data::Float(f) => SavedCellValue::Number(*f),
            Data::Int(i) => SavedCellValue::Number(*i as f64),
            Data::Bool(b) => SavedCellValue::Boolean(*b),
            Data::Error(e) => SavedCellValue::Error(e.to_string()),
            Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
                Some(date) if !dt.is_duration() => SavedCellValue::DateTime(date),
                _ => SavedCellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => SavedCellValue::Text(s.clone()),
        };

        sheet.set_cell(
            start_row + row as u32 + 1,
            start_col + col as u32 + 1,
            SavedCell::literal(value),
        );
    }
}

/// Attaches formula text. The cached value read by `read_values` stays as
/// the formula's result; formulas without a cached value get an empty cache.
fn read_formulas(sheet: &mut Sheet, range: &Range<String>) {
    let Some((start_row, start_col)) = range.start() else {
        return;
    };

    for (row, col, text) in range.used_cells() {
        if text.is_empty() {
            continue;
        }
        let key = (start_row + row as u32 + 1, start_col + col as u32 + 1);
        let formula = text.strip_prefix('=').unwrap_or(text).to_string();
        sheet
            .cells
            .entry(key)
            .or_insert_with(SavedCell::empty)
            .formula = Some(formula);
    }
}
