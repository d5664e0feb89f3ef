//! FILENAME: app/server/src/coerce.rs
// PURPOSE: Every conversion between tool JSON, document cells and engine content.
// CONTEXT: Lossy conversions live here and nowhere else:
//
//   document cell   -> engine content
//   -------------      --------------
//   empty / absent  -> Empty (clears)
//   number          -> Number
//   text            -> Text
//   boolean         -> Boolean
//   date-time       -> Number (1900-system serial)        [lossy]
//   error literal   -> Text (its display string)          [lossy]
//   formula         -> Formula("=" + stored expression)

use crate::error::ToolError;
use engine::{CellContent, CellValue};
use persistence::{
    date_to_serial, format_iso_datetime, parse_iso_datetime, SavedCell, SavedCellValue,
};
use serde_json::{Map, Number, Value};

// ============================================================================
// DOCUMENT -> ENGINE
// ============================================================================

pub fn to_engine_content(cell: Option<&SavedCell>) -> CellContent {
    let Some(cell) = cell else {
        return CellContent::Empty;
    };
    if let Some(formula) = cell.formula_text() {
        return CellContent::Formula(formula);
    }
    match &cell.value {
        SavedCellValue::Empty => CellContent::Empty,
        SavedCellValue::Number(n) => CellContent::Number(*n),
        SavedCellValue::Text(s) => CellContent::Text(s.clone()),
        SavedCellValue::Boolean(b) => CellContent::Boolean(*b),
        SavedCellValue::DateTime(dt) => CellContent::Number(date_to_serial(dt)),
        SavedCellValue::Error(text) => CellContent::Text(text.clone()),
    }
}

/// Raw stored value of a document cell, as the engine would report it.
/// Used only when the engine cannot answer.
pub fn document_value(cell: Option<&SavedCell>) -> CellValue {
    match cell.map(|c| &c.value) {
        None | Some(SavedCellValue::Empty) => CellValue::Empty,
        Some(SavedCellValue::Number(n)) => CellValue::Number(*n),
        Some(SavedCellValue::Text(s)) => CellValue::Text(s.clone()),
        Some(SavedCellValue::Boolean(b)) => CellValue::Boolean(*b),
        Some(SavedCellValue::DateTime(dt)) => CellValue::Number(date_to_serial(dt)),
        Some(SavedCellValue::Error(text)) => CellValue::Text(text.clone()),
    }
}

// ============================================================================
// TOOL INPUT -> DOCUMENT
// ============================================================================

/// Maps a tool input value to a document cell:
/// null -> empty, bool, number, "=..." -> formula, other string -> text,
/// {"date": "<ISO-8601>"} -> date-time. An empty string clears the cell.
pub fn cell_from_json(value: &Value) -> Result<SavedCell, ToolError> {
    match value {
        Value::Null => Ok(SavedCell::empty()),
        Value::Bool(b) => Ok(SavedCell::literal(SavedCellValue::Boolean(*b))),
        Value::Number(n) => n
            .as_f64()
            .map(|n| SavedCell::literal(SavedCellValue::Number(n)))
            .ok_or_else(|| ToolError::InvalidArgument(format!("Unsupported number {}", n))),
        Value::String(s) if s.is_empty() => Ok(SavedCell::empty()),
        Value::String(s) if s.starts_with('=') => Ok(SavedCell::formula(s)),
        Value::String(s) => Ok(SavedCell::literal(SavedCellValue::Text(s.clone()))),
        Value::Object(map) => date_from_object(map),
        Value::Array(_) => Err(ToolError::InvalidArgument(
            "A cell value cannot be an array".to_string(),
        )),
    }
}

fn date_from_object(map: &Map<String, Value>) -> Result<SavedCell, ToolError> {
    let text = match (map.len(), map.get("date")) {
        (1, Some(Value::String(text))) => text,
        _ => {
            return Err(ToolError::InvalidArgument(
                "Object cell values must have the form {\"date\": \"<ISO-8601>\"}".to_string(),
            ))
        }
    };
    parse_iso_datetime(text)
        .map(|dt| SavedCell::literal(SavedCellValue::DateTime(dt)))
        .ok_or_else(|| ToolError::InvalidArgument(format!("'{}' is not an ISO-8601 date", text)))
}

// ============================================================================
// VALUES -> TOOL OUTPUT
// ============================================================================

pub fn value_to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Number(n) => number_to_json(*n),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Error(e) => Value::String(e.to_string()),
    }
}

/// Date-times surface as ISO-8601 text, error literals as their display text.
pub fn saved_value_to_json(value: &SavedCellValue) -> Value {
    match value {
        SavedCellValue::Empty => Value::Null,
        SavedCellValue::Number(n) => number_to_json(*n),
        SavedCellValue::Text(s) => Value::String(s.clone()),
        SavedCellValue::Boolean(b) => Value::Bool(*b),
        SavedCellValue::DateTime(dt) => Value::String(format_iso_datetime(dt)),
        SavedCellValue::Error(text) => Value::String(text.clone()),
    }
}

fn number_to_json(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
