//! FILENAME: app/server/src/commands/workbooks.rs
// PURPOSE: Workbook lifecycle tools: create, open, save, close, list, recalculate.

use crate::api_types::{
    CloseWorkbookResult, CreateWorkbookResult, OpenWorkbookResult, RecalculateResult,
    SaveWorkbookResult, WorkbookSummary,
};
use crate::error::ToolError;
use crate::sync;
use crate::{log_enter, log_exit, log_info, AppState};
use persistence::save_xlsx;
use std::path::PathBuf;

pub fn create_workbook(state: &mut AppState) -> Result<CreateWorkbookResult, ToolError> {
    let handle = state.registry.create()?;
    Ok(CreateWorkbookResult { handle })
}

pub fn open_workbook(state: &mut AppState, path: &str) -> Result<OpenWorkbookResult, ToolError> {
    log_enter!("CMD", "open_workbook", "path={}", path);
    let handle = state.registry.open(&PathBuf::from(path))?;
    let sheets = state.registry.get(&handle)?.document.sheet_names();
    log_exit!("CMD", "open_workbook", "{} sheets={}", handle, sheets.len());
    Ok(OpenWorkbookResult { handle, sheets })
}

/// Saves to `path`, or to the remembered path when none is given. The
/// saved path is remembered for the next save.
pub fn save_workbook(
    state: &mut AppState,
    handle: &str,
    path: Option<&str>,
) -> Result<SaveWorkbookResult, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let target = match path.filter(|p| !p.trim().is_empty()) {
        Some(p) => PathBuf::from(p),
        None => session.file_path.clone().ok_or(ToolError::MissingFilePath)?,
    };

    let refreshed = sync::sync_to_document(session);
    save_xlsx(&session.document, &target)?;
    session.file_path = Some(target.clone());

    log_info!("IO", "saved {} to {:?} ({} formula results refreshed)", handle, target, refreshed);
    Ok(SaveWorkbookResult {
        saved_path: target.display().to_string(),
    })
}

pub fn close_workbook(state: &mut AppState, handle: &str) -> Result<CloseWorkbookResult, ToolError> {
    state.registry.close(handle)?;
    Ok(CloseWorkbookResult { closed: true })
}

pub fn list_workbooks(state: &AppState) -> Vec<WorkbookSummary> {
    state.registry.list()
}

/// Recalculates every formula and refreshes the document's cached results.
pub fn recalculate(state: &mut AppState, handle: &str) -> Result<RecalculateResult, ToolError> {
    let session = state.registry.get_mut(handle)?;
    let formula_cells = session.engine.recalculate();
    sync::sync_to_document(session);
    log_info!("CMD", "recalculated {}: {} formula cells", handle, formula_cells);
    Ok(RecalculateResult { formula_cells })
}
