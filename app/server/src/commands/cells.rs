//! FILENAME: app/server/src/commands/cells.rs
// PURPOSE: Cell and range tools. Every value returned as `calculatedValue`
//          comes from the engine through the sync layer.

use crate::api_types::{
    CellReadResult, CellWriteResult, ColumnInfo, FormulaResult, RangeReadResult, RangeWriteResult,
};
use crate::coerce::{cell_from_json, saved_value_to_json, value_to_json};
use crate::error::ToolError;
use crate::session::{Session, SheetRef};
use crate::sync;
use crate::{log_debug, AppState};
use engine::{format_column, parse_range, parse_reference, CellAddress, CellRange};
use serde_json::Value;

pub const DEFAULT_HEADER_ROW: u32 = 1;

fn session_and_sheet<'a>(
    state: &'a AppState,
    handle: &str,
    sheet: &SheetRef,
) -> Result<(&'a Session, String), ToolError> {
    let session = state.registry.get(handle)?;
    let name = session.resolve_sheet(sheet)?;
    Ok((session, name))
}

// ============================================================================
// SINGLE CELLS
// ============================================================================

pub fn read_cell(
    state: &AppState,
    handle: &str,
    sheet: &SheetRef,
    address: &str,
) -> Result<CellReadResult, ToolError> {
    let (session, name) = session_and_sheet(state, handle, sheet)?;
    let address = parse_reference(address)?;

    let stored = session
        .document
        .sheet(&name)
        .and_then(|s| s.cell(address.row, address.col));

    Ok(CellReadResult {
        address: address.to_string(),
        value: stored.map_or(Value::Null, |c| saved_value_to_json(&c.value)),
        calculated_value: value_to_json(&sync::read_value(session, &name, address)),
        formula: stored.and_then(|c| c.formula_text()),
    })
}

pub fn write_cell(
    state: &mut AppState,
    handle: &str,
    sheet: &SheetRef,
    address: &str,
    value: &Value,
) -> Result<CellWriteResult, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let name = session.resolve_sheet(sheet)?;
    let address = parse_reference(address)?;
    let cell = cell_from_json(value)?;

    sync::write_cell(session, &name, address, cell)?;

    Ok(CellWriteResult {
        address: address.to_string(),
        calculated_value: value_to_json(&sync::read_value(session, &name, address)),
    })
}

pub fn get_formula(
    state: &AppState,
    handle: &str,
    sheet: &SheetRef,
    address: &str,
) -> Result<FormulaResult, ToolError> {
    let (session, name) = session_and_sheet(state, handle, sheet)?;
    let address = parse_reference(address)?;

    let formula = session
        .document
        .sheet(&name)
        .and_then(|s| s.cell(address.row, address.col))
        .and_then(|c| c.formula_text());

    Ok(FormulaResult {
        address: address.to_string(),
        formula,
        calculated_value: value_to_json(&sync::read_value(session, &name, address)),
    })
}

// ============================================================================
// RANGES
// ============================================================================

pub fn read_range(
    state: &AppState,
    handle: &str,
    sheet: &SheetRef,
    range: &str,
) -> Result<RangeReadResult, ToolError> {
    let (session, name) = session_and_sheet(state, handle, sheet)?;
    let range = parse_range(range)?;

    let values = sync::read_range(session, &name, &range)
        .iter()
        .map(|row| row.iter().map(value_to_json).collect())
        .collect();

    Ok(RangeReadResult {
        range: range.to_string(),
        values,
    })
}

/// Writes a row-major block with its top-left corner at `start_cell`.
/// Rows may differ in length; the reported range spans the longest row.
pub fn write_range(
    state: &mut AppState,
    handle: &str,
    sheet: &SheetRef,
    start_cell: &str,
    values: &[Vec<Value>],
) -> Result<RangeWriteResult, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let name = session.resolve_sheet(sheet)?;
    let start = parse_reference(start_cell)?;

    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Err(ToolError::InvalidArgument(
            "values must contain at least one cell".to_string(),
        ));
    }

    let too_large = || ToolError::InvalidArgument("values extend past the last addressable cell".to_string());
    let mut cells = Vec::new();
    for (r, row) in values.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let address = start.offset(r as u32, c as u32).ok_or_else(too_large)?;
            cells.push((address, cell_from_json(value)?));
        }
    }
    let end = start
        .offset(values.len() as u32 - 1, width as u32 - 1)
        .ok_or_else(too_large)?;

    let cells_written = sync::write_cells(session, &name, cells)?;
    let range = CellRange::from_corners(start, end);
    log_debug!("CMD", "write_range '{}'!{}: {} cells", name, range, cells_written);

    Ok(RangeWriteResult {
        range: range.to_string(),
        cells_written,
    })
}

/// Columns of the sheet's used area with the header text found in
/// `header_row` (default 1).
pub fn list_columns(
    state: &AppState,
    handle: &str,
    sheet: &SheetRef,
    header_row: Option<u32>,
) -> Result<Vec<ColumnInfo>, ToolError> {
    let (session, name) = session_and_sheet(state, handle, sheet)?;
    let header_row = header_row.unwrap_or(DEFAULT_HEADER_ROW);
    if header_row == 0 {
        return Err(ToolError::InvalidArgument(
            "headerRow is 1-based and must be at least 1".to_string(),
        ));
    }

    let (_, columns) = session
        .document
        .sheet(&name)
        .map(|s| s.actual_dimensions())
        .unwrap_or((0, 0));

    Ok((1..=columns)
        .map(|col| ColumnInfo {
            column: format_column(col),
            index: col,
            header: sync::read_value(session, &name, CellAddress::new(header_row, col)).to_string(),
        })
        .collect())
}
