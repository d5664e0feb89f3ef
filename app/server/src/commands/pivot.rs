//! FILENAME: app/server/src/commands/pivot.rs
// PURPOSE: The createPivotTable tool.

use crate::api_types::{PivotTableArgs, PivotTableResult};
use crate::error::ToolError;
use crate::pivot::{create_pivot_table as run_pivot, PivotRequest};
use crate::{log_enter, log_exit, AppState};
use pivot_engine::PivotDefinition;

pub fn create_pivot_table(
    state: &mut AppState,
    args: PivotTableArgs,
) -> Result<PivotTableResult, ToolError> {
    log_enter!(
        "CMD",
        "create_pivot_table",
        "handle={} source={}!{} rows={:?} values={}",
        args.handle,
        args.source_sheet,
        args.source_range,
        args.row_fields,
        args.data_fields.len()
    );

    if args.data_fields.is_empty() && args.row_fields.is_empty() {
        return Err(ToolError::InvalidArgument(
            "A pivot table needs at least one row field or data field".to_string(),
        ));
    }

    let prefix = state.config.pivot_sheet_prefix.clone();
    let session = state.registry.get_mut(&args.handle)?;
    let request = PivotRequest {
        source_sheet: session.resolve_sheet(&args.source_sheet)?,
        source_range: args.source_range,
        definition: PivotDefinition::new(args.row_fields, args.data_fields),
        dest_sheet: args.dest_sheet,
        dest_cell: args.dest_cell,
    };

    let placement = run_pivot(session, &request, &prefix)?;
    log_exit!("CMD", "create_pivot_table", "{}!{}", placement.sheet, placement.cell);

    Ok(PivotTableResult {
        sheet: placement.sheet,
        cell: placement.cell,
    })
}
