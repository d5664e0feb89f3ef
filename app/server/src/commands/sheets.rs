//! FILENAME: app/server/src/commands/sheets.rs
// PURPOSE: Sheet management tools: list, create, delete, rename, info.
// CONTEXT: Sheet indices are 1-based and recomputed from the current order.

use crate::api_types::{DeleteSheetResult, SheetDetails, SheetInfo};
use crate::error::ToolError;
use crate::session::SheetRef;
use crate::AppState;

pub fn list_sheets(state: &AppState, handle: &str) -> Result<Vec<SheetInfo>, ToolError> {
    let session = state.registry.get(handle)?;
    Ok(session
        .document
        .sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| SheetInfo {
            index: i + 1,
            name: sheet.name.clone(),
        })
        .collect())
}

pub fn create_sheet(state: &mut AppState, handle: &str, name: &str) -> Result<SheetInfo, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let index = session.add_sheet(name)?;
    Ok(SheetInfo {
        index,
        name: name.to_string(),
    })
}

pub fn delete_sheet(
    state: &mut AppState,
    handle: &str,
    sheet: &SheetRef,
) -> Result<DeleteSheetResult, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let name = session.resolve_sheet(sheet)?;
    session.remove_sheet(&name)?;
    Ok(DeleteSheetResult { deleted: name })
}

pub fn rename_sheet(
    state: &mut AppState,
    handle: &str,
    sheet: &SheetRef,
    new_name: &str,
) -> Result<SheetInfo, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let name = session.resolve_sheet(sheet)?;
    let index = session.rename_sheet(&name, new_name)?;
    Ok(SheetInfo {
        index,
        name: new_name.to_string(),
    })
}

pub fn get_sheet_info(
    state: &AppState,
    handle: &str,
    sheet: &SheetRef,
) -> Result<SheetDetails, ToolError> {
    let session = state.registry.get(handle)?;
    let name = session.resolve_sheet(sheet)?;
    let index = session
        .sheet_index(&name)
        .ok_or_else(|| ToolError::SheetNotFound(sheet.to_string()))?;
    let document_sheet = session
        .document
        .sheet(&name)
        .ok_or_else(|| ToolError::SheetNotFound(sheet.to_string()))?;

    let (row_count, column_count) = document_sheet.dimensions();
    let (actual_row_count, actual_column_count) = document_sheet.actual_dimensions();

    Ok(SheetDetails {
        index,
        name,
        row_count,
        column_count,
        actual_row_count,
        actual_column_count,
    })
}
