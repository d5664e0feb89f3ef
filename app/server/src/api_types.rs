//! FILENAME: app/server/src/api_types.rs
// PURPOSE: Argument and result records of the tool surface.
// CONTEXT: All structs use camelCase serialization. Cell values cross the
//          boundary as serde_json::Value (see coerce.rs for the mapping).

use crate::session::SheetRef;
use pivot_engine::ValueField;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// ARGUMENTS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleArgs {
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWorkbookArgs {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkbookArgs {
    pub handle: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetArgs {
    pub handle: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetArgs {
    pub handle: String,
    pub sheet: SheetRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSheetArgs {
    pub handle: String,
    pub sheet: SheetRef,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellArgs {
    pub handle: String,
    pub sheet: SheetRef,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteCellArgs {
    pub handle: String,
    pub sheet: SheetRef,
    pub address: String,
    /// Absent means null: the cell is cleared.
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeArgs {
    pub handle: String,
    pub sheet: SheetRef,
    pub range: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRangeArgs {
    pub handle: String,
    pub sheet: SheetRef,
    pub start_cell: String,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListColumnsArgs {
    pub handle: String,
    pub sheet: SheetRef,
    #[serde(default)]
    pub header_row: Option<u32>,
}

/// Input of createPivotTable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTableArgs {
    pub handle: String,
    pub source_sheet: SheetRef,
    pub source_range: String,
    #[serde(default)]
    pub row_fields: Vec<String>,
    pub data_fields: Vec<ValueField>,
    #[serde(default)]
    pub dest_sheet: Option<String>,
    #[serde(default)]
    pub dest_cell: Option<String>,
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkbookResult {
    pub handle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWorkbookResult {
    pub handle: String,
    pub sheets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkbookResult {
    pub saved_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseWorkbookResult {
    pub closed: bool,
}

/// One entry of listWorkbooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSummary {
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub sheet_count: usize,
}

/// Information about a single sheet. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDetails {
    pub index: usize,
    pub name: String,
    pub row_count: u32,
    pub column_count: u32,
    pub actual_row_count: u32,
    pub actual_column_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetResult {
    pub deleted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellReadResult {
    pub address: String,
    /// Stored document value (for formulas, the cached result).
    pub value: Value,
    pub calculated_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellWriteResult {
    pub address: String,
    pub calculated_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReadResult {
    pub range: String,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeWriteResult {
    pub range: String,
    pub cells_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column letters, e.g. "B".
    pub column: String,
    /// 1-based column number.
    pub index: u32,
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaResult {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub calculated_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateResult {
    pub formula_cells: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTableResult {
    pub sheet: String,
    pub cell: String,
}
