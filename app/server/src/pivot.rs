//! FILENAME: app/server/src/pivot.rs
// PURPOSE: Pivot table orchestration: source range -> cache -> view -> sheet.
// CONTEXT: The source is read through calculated values, so formula cells
//          contribute their results. The result grid is written into the
//          destination sheet's document, then the whole sheet is pushed to
//          the engine.

use crate::error::ToolError;
use crate::session::Session;
use crate::sync;
use crate::{log_debug, log_info, log_warn};
use chrono::Utc;
use engine::{parse_range, parse_reference, CellAddress, CellRange, CellValue};
use persistence::{SavedCell, SavedCellValue};
use pivot_engine::{calculate_pivot, PivotCache, PivotDefinition, PivotView};

pub const DEFAULT_DEST_CELL: &str = "A1";

/// A pivot request with its source sheet already resolved to a name.
#[derive(Debug, Clone)]
pub struct PivotRequest {
    pub source_sheet: String,
    pub source_range: String,
    pub definition: PivotDefinition,
    pub dest_sheet: Option<String>,
    pub dest_cell: Option<String>,
}

/// Where a pivot result landed.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPlacement {
    pub sheet: String,
    pub cell: String,
    /// (rows, columns) of the written grid, header included.
    pub size: (usize, usize),
}

/// Builds the cache from a source range: first row is the header, every
/// row below it a record.
pub(crate) fn build_cache_from_range(session: &Session, sheet: &str, range: &CellRange) -> PivotCache {
    let mut rows = sync::read_range(session, sheet, range).into_iter();
    let header = rows.next().unwrap_or_default();
    PivotCache::new(&header, rows.collect())
}

/// A sheet name built from the prefix and the current time, bumped until it
/// is unused.
pub(crate) fn synthesize_sheet_name(session: &Session, prefix: &str) -> String {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let candidate = format!("{}{}", prefix, stamp);
        if session.document.sheet(&candidate).is_none() {
            return candidate;
        }
        stamp += 1;
    }
}

fn resolve_dest_sheet(
    session: &mut Session,
    dest_sheet: Option<&str>,
    prefix: &str,
) -> Result<String, ToolError> {
    match dest_sheet {
        Some(name) if session.document.sheet(name).is_some() => {
            log_debug!("PIVOT", "reusing destination sheet '{}'", name);
            Ok(name.to_string())
        }
        Some(name) => {
            session.add_sheet(name)?;
            Ok(name.to_string())
        }
        None => {
            let name = synthesize_sheet_name(session, prefix);
            session.add_sheet(&name)?;
            Ok(name)
        }
    }
}

/// Rejects a view that would run past the sheet limits when placed at
/// `origin`. Runs before any destination sheet is created.
fn check_view_fits(session: &Session, view: &PivotView, origin: CellAddress) -> Result<(), ToolError> {
    let (height, width) = view.size();
    let far_corner = origin
        .offset(height.saturating_sub(1) as u32, width.saturating_sub(1) as u32)
        .ok_or_else(|| ToolError::InvalidArgument("Pivot result does not fit the sheet".to_string()))?;
    sync::check_bounds(session, far_corner)
}

/// Writes the view's grid into the destination sheet's document with its
/// top-left corner at `origin`.
fn write_view_to_document(
    session: &mut Session,
    sheet: &str,
    view: &PivotView,
    origin: CellAddress,
) -> Result<(), ToolError> {
    let document_sheet = session
        .document
        .sheet_mut(sheet)
        .ok_or_else(|| ToolError::SheetNotFound(format!("'{}'", sheet)))?;

    for (r, row) in view.to_grid().into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            let cell = match value {
                CellValue::Empty => SavedCell::empty(),
                other => SavedCell::literal(SavedCellValue::from_value(&other)),
            };
            document_sheet.set_cell(origin.row + r as u32, origin.col + c as u32, cell);
        }
    }
    Ok(())
}

pub fn create_pivot_table(
    session: &mut Session,
    request: &PivotRequest,
    sheet_prefix: &str,
) -> Result<PivotPlacement, ToolError> {
    let range = parse_range(&request.source_range)?;
    let origin = parse_reference(request.dest_cell.as_deref().unwrap_or(DEFAULT_DEST_CELL))?;

    let cache = build_cache_from_range(session, &request.source_sheet, &range);
    log_debug!(
        "PIVOT",
        "source '{}'!{}: {} fields, {} records",
        request.source_sheet,
        range,
        cache.field_names.len(),
        cache.record_count()
    );

    let output = calculate_pivot(&request.definition, &cache);
    for warning in &output.warnings {
        log_warn!("PIVOT", "{}", warning);
    }

    check_view_fits(session, &output.view, origin)?;
    let dest_sheet = resolve_dest_sheet(session, request.dest_sheet.as_deref(), sheet_prefix)?;
    write_view_to_document(session, &dest_sheet, &output.view, origin)?;
    sync::sync_sheet_to_engine(session, &dest_sheet)?;

    let size = output.view.size();
    log_info!(
        "PIVOT",
        "wrote {} groups to '{}'!{} ({}x{})",
        output.view.rows.len(),
        dest_sheet,
        origin,
        size.0,
        size.1
    );

    Ok(PivotPlacement {
        sheet: dest_sheet,
        cell: origin.to_string(),
        size,
    })
}
