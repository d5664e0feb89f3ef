//! FILENAME: app/server/src/dispatch.rs
// PURPOSE: Maps protocol requests to tool handlers.
// FORMAT: one JSON object per line in each direction.
//   request:  {"id": <any>, "tool": "<name>", "arguments": {...}}
//   response: {"id": ..., "ok": true, "result": ...}
//             {"id": ..., "ok": false, "error": {"code": "...", "message": "..."}}

use crate::api_types::{
    CellArgs, CreateSheetArgs, HandleArgs, ListColumnsArgs, OpenWorkbookArgs, PivotTableArgs,
    RangeArgs, RenameSheetArgs, SaveWorkbookArgs, SheetArgs, WriteCellArgs, WriteRangeArgs,
};
use crate::commands;
use crate::error::ToolError;
use crate::{log_debug, log_error, log_warn, AppState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENCODE_FAILURE: &str =
    r#"{"id":null,"ok":false,"error":{"code":"InvalidRequest","message":"response could not be encoded"}}"#;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl From<&ToolError> for ErrorPayload {
    fn from(err: &ToolError) -> Self {
        ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl Response {
    fn success(id: Value, result: Value) -> Self {
        Response {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, err: &ToolError) -> Self {
        Response {
            id,
            ok: false,
            result: None,
            error: Some(ErrorPayload::from(err)),
        }
    }
}

fn args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArgument(e.to_string()))
}

fn to_value<T: Serialize>(result: T) -> Result<Value, ToolError> {
    serde_json::to_value(result).map_err(|e| ToolError::InvalidRequest(e.to_string()))
}

/// Runs one tool with its JSON arguments.
pub fn dispatch(state: &mut AppState, tool: &str, arguments: Value) -> Result<Value, ToolError> {
    match tool {
        "createWorkbook" => to_value(commands::create_workbook(state)?),
        "openWorkbook" => {
            let a: OpenWorkbookArgs = args(arguments)?;
            to_value(commands::open_workbook(state, &a.path)?)
        }
        "saveWorkbook" => {
            let a: SaveWorkbookArgs = args(arguments)?;
            to_value(commands::save_workbook(state, &a.handle, a.path.as_deref())?)
        }
        "closeWorkbook" => {
            let a: HandleArgs = args(arguments)?;
            to_value(commands::close_workbook(state, &a.handle)?)
        }
        "listWorkbooks" => to_value(commands::list_workbooks(state)),
        "listSheets" => {
            let a: HandleArgs = args(arguments)?;
            to_value(commands::list_sheets(state, &a.handle)?)
        }
        "createSheet" => {
            let a: CreateSheetArgs = args(arguments)?;
            to_value(commands::create_sheet(state, &a.handle, &a.name)?)
        }
        "deleteSheet" => {
            let a: SheetArgs = args(arguments)?;
            to_value(commands::delete_sheet(state, &a.handle, &a.sheet)?)
        }
        "renameSheet" => {
            let a: RenameSheetArgs = args(arguments)?;
            to_value(commands::rename_sheet(state, &a.handle, &a.sheet, &a.new_name)?)
        }
        "getSheetInfo" => {
            let a: SheetArgs = args(arguments)?;
            to_value(commands::get_sheet_info(state, &a.handle, &a.sheet)?)
        }
        "readCell" => {
            let a: CellArgs = args(arguments)?;
            to_value(commands::read_cell(state, &a.handle, &a.sheet, &a.address)?)
        }
        "writeCell" => {
            let a: WriteCellArgs = args(arguments)?;
            to_value(commands::write_cell(state, &a.handle, &a.sheet, &a.address, &a.value)?)
        }
        "readRange" => {
            let a: RangeArgs = args(arguments)?;
            to_value(commands::read_range(state, &a.handle, &a.sheet, &a.range)?)
        }
        "writeRange" => {
            let a: WriteRangeArgs = args(arguments)?;
            to_value(commands::write_range(state, &a.handle, &a.sheet, &a.start_cell, &a.values)?)
        }
        "listColumns" => {
            let a: ListColumnsArgs = args(arguments)?;
            to_value(commands::list_columns(state, &a.handle, &a.sheet, a.header_row)?)
        }
        "getFormula" => {
            let a: CellArgs = args(arguments)?;
            to_value(commands::get_formula(state, &a.handle, &a.sheet, &a.address)?)
        }
        "recalculate" => {
            let a: HandleArgs = args(arguments)?;
            to_value(commands::recalculate(state, &a.handle)?)
        }
        "createPivotTable" => {
            let a: PivotTableArgs = args(arguments)?;
            to_value(commands::create_pivot_table(state, a)?)
        }
        other => Err(ToolError::InvalidRequest(format!("Unknown tool '{}'", other))),
    }
}

/// Handles one protocol line. Blank lines produce no response.
pub fn handle_line(state: &mut AppState, line: &str) -> Option<Response> {
    if line.trim().is_empty() {
        return None;
    }

    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            log_warn!("CMD", "malformed request: {}", e);
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").cloned())
                .unwrap_or(Value::Null);
            return Some(Response::failure(id, &ToolError::InvalidRequest(e.to_string())));
        }
    };

    log_debug!("CMD", "-> {} id={}", request.tool, request.id);
    let response = match dispatch(state, &request.tool, request.arguments) {
        Ok(result) => Response::success(request.id, result),
        Err(err) => {
            log_warn!("CMD", "{} failed: {} ({})", request.tool, err, err.code());
            Response::failure(request.id, &err)
        }
    };
    Some(response)
}

/// Serializes a response as one protocol line (no trailing newline).
pub fn encode_response(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        log_error!("CMD", "cannot encode response: {}", e);
        ENCODE_FAILURE.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app_state;
    use serde_json::json;

    #[test]
    fn test_round_trip_through_protocol_lines() {
        let mut state = create_app_state();
        let response = handle_line(&mut state, r#"{"id": 1, "tool": "createWorkbook"}"#).unwrap();
        assert!(response.ok);
        assert_eq!(response.result, Some(json!({"handle": "wb_1"})));

        let line = r#"{"id": "w", "tool": "writeCell", "arguments": {"handle": "wb_1", "sheet": 1, "address": "A1", "value": "=2*3"}}"#;
        let response = handle_line(&mut state, line).unwrap();
        assert_eq!(response.id, json!("w"));
        assert_eq!(
            response.result,
            Some(json!({"address": "A1", "calculatedValue": 6.0}))
        );
    }

    #[test]
    fn test_errors_carry_code_and_id() {
        let mut state = create_app_state();
        let response =
            handle_line(&mut state, r#"{"id": 7, "tool": "listSheets", "arguments": {"handle": "wb_9"}}"#)
                .unwrap();
        assert!(!response.ok);
        assert_eq!(response.id, json!(7));
        assert_eq!(response.error.unwrap().code, "WorkbookNotFound");
    }

    #[test]
    fn test_malformed_requests() {
        let mut state = create_app_state();
        assert!(handle_line(&mut state, "   ").is_none());

        let response = handle_line(&mut state, "{not json").unwrap();
        assert_eq!(response.error.unwrap().code, "InvalidRequest");

        let response = handle_line(&mut state, r#"{"id": 3, "arguments": {}}"#).unwrap();
        assert_eq!(response.id, json!(3));
        assert_eq!(response.error.unwrap().code, "InvalidRequest");

        let response = handle_line(&mut state, r#"{"id": 4, "tool": "fly"}"#).unwrap();
        assert_eq!(response.error.unwrap().code, "InvalidRequest");

        let response = handle_line(&mut state, r#"{"id": 5, "tool": "readCell", "arguments": {}}"#).unwrap();
        assert_eq!(response.error.unwrap().code, "InvalidArgument");
    }

    #[test]
    fn test_encoded_response_omits_absent_fields() {
        let response = Response::success(json!(1), json!({"closed": true}));
        assert_eq!(
            encode_response(&response),
            r#"{"id":1,"ok":true,"result":{"closed":true}}"#
        );
    }
}
