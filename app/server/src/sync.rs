//! FILENAME: app/server/src/sync.rs
// PURPOSE: Keeps a session's document and engine in agreement.
// CONTEXT: Writes go to the document first, then to the engine at
//          (row - 1, col - 1). Reads come from the engine. A sheet missing
//          from the engine is a consistency fault: reads fall back to the
//          document's stored value and the fault is logged, not returned.

use crate::coerce::{document_value, to_engine_content};
use crate::error::ToolError;
use crate::session::Session;
use crate::{log_debug, log_error, log_warn};
use engine::{CellAddress, CellContent, CellRange, CellValue};
use persistence::{SavedCell, SavedCellValue};

// ============================================================================
// WRITE PATH
// ============================================================================

/// Rejects addresses the engine cannot hold, before either store is touched.
pub(crate) fn check_bounds(session: &Session, address: CellAddress) -> Result<(), ToolError> {
    let limits = session.engine.config();
    if address.row > limits.max_rows || address.col > limits.max_columns {
        return Err(ToolError::InvalidArgument(format!(
            "{} is outside the sheet limits of {} rows x {} columns",
            address, limits.max_rows, limits.max_columns
        )));
    }
    Ok(())
}

pub fn write_cell(
    session: &mut Session,
    sheet: &str,
    address: CellAddress,
    cell: SavedCell,
) -> Result<(), ToolError> {
    write_cells(session, sheet, vec![(address, cell)]).map(|_| ())
}

/// Writes a batch of cells to both stores; the engine recalculates once.
/// Returns the number of cells written.
pub fn write_cells(
    session: &mut Session,
    sheet: &str,
    cells: Vec<(CellAddress, SavedCell)>,
) -> Result<usize, ToolError> {
    for (address, _) in &cells {
        check_bounds(session, *address)?;
    }

    let contents: Vec<(u32, u32, CellContent)> = cells
        .iter()
        .map(|(address, cell)| {
            let (row, col) = address.to_engine();
            (row, col, to_engine_content(Some(cell)))
        })
        .collect();

    let document_sheet = session
        .document
        .sheet_mut(sheet)
        .ok_or_else(|| ToolError::SheetNotFound(format!("'{}'", sheet)))?;
    let written = cells.len();
    for (address, cell) in cells {
        document_sheet.set_cell(address.row, address.col, cell);
    }

    let Some(id) = session.engine_sheet(sheet) else {
        log_warn!("SYNC", "write '{}': no engine sheet, {} cells stored in document only", sheet, written);
        return Ok(written);
    };
    if let Err(e) = session.engine.set_cell_contents(id, contents) {
        log_error!("SYNC", "write '{}': document updated but engine rejected the batch: {}", sheet, e);
        return Err(e.into());
    }

    log_debug!("SYNC", "wrote {} cells to '{}'", written, sheet);
    Ok(written)
}

/// Replaces the engine content of a sheet with every cell the document
/// holds. Positions the document never stored are empty in both stores, so
/// only stored entries are coerced and sent.
pub fn sync_sheet_to_engine(session: &mut Session, sheet: &str) -> Result<(), ToolError> {
    let document_sheet = session
        .document
        .sheet(sheet)
        .ok_or_else(|| ToolError::SheetNotFound(format!("'{}'", sheet)))?;

    let (rows, cols) = document_sheet.dimensions();
    let contents: Vec<(u32, u32, CellContent)> = document_sheet
        .cells
        .iter()
        .map(|(&(row, col), cell)| {
            let (r, c) = CellAddress::new(row, col).to_engine();
            (r, c, to_engine_content(Some(cell)))
        })
        .collect();

    let Some(id) = session.engine_sheet(sheet) else {
        log_warn!("SYNC", "full sync '{}': no engine sheet, skipped", sheet);
        return Ok(());
    };
    match session.engine.set_sheet_content(id, contents) {
        Ok(sent) => {
            log_debug!("SYNC", "full sync '{}': {} cells over {}x{}", sheet, sent, rows, cols);
            Ok(())
        }
        Err(e) => {
            log_error!("SYNC", "full sync '{}' failed: {}", sheet, e);
            Err(e.into())
        }
    }
}

// ============================================================================
// READ PATH
// ============================================================================

/// Calculated value of one cell.
pub fn read_value(session: &Session, sheet: &str, address: CellAddress) -> CellValue {
    let (row, col) = address.to_engine();
    let engine_value = session
        .engine_sheet(sheet)
        .map(|id| session.engine.cell_value(id, row, col));

    match engine_value {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            log_warn!("SYNC", "read '{}'!{}: engine error ({}), using document value", sheet, address, e);
            stored_value(session, sheet, address)
        }
        None => {
            log_warn!("SYNC", "read '{}'!{}: no engine sheet, using document value", sheet, address);
            stored_value(session, sheet, address)
        }
    }
}

/// Calculated values of a range, row-major.
pub fn read_range(session: &Session, sheet: &str, range: &CellRange) -> Vec<Vec<CellValue>> {
    let Some(id) = session.engine_sheet(sheet) else {
        log_warn!("SYNC", "read '{}'!{}: no engine sheet, using document values", sheet, range);
        return range
            .rows()
            .map(|row| {
                range
                    .cols()
                    .map(|col| stored_value(session, sheet, CellAddress::new(row, col)))
                    .collect()
            })
            .collect();
    };

    range
        .rows()
        .map(|row| {
            range
                .cols()
                .map(|col| {
                    let (r, c) = CellAddress::new(row, col).to_engine();
                    session
                        .engine
                        .cell_value(id, r, c)
                        .unwrap_or_else(|_| stored_value(session, sheet, CellAddress::new(row, col)))
                })
                .collect()
        })
        .collect()
}

fn stored_value(session: &Session, sheet: &str, address: CellAddress) -> CellValue {
    document_value(
        session
            .document
            .sheet(sheet)
            .and_then(|s| s.cell(address.row, address.col)),
    )
}

// ============================================================================
// ENGINE -> DOCUMENT
// ============================================================================

/// Overwrites every formula cell's cached result with the engine's current
/// value. Returns the number of formula cells refreshed.
pub fn sync_to_document(session: &mut Session) -> usize {
    let mut refreshed = 0;
    let Session {
        document, engine, ..
    } = session;

    for sheet in &mut document.sheets {
        let Some(id) = engine.sheet_id(&sheet.name) else {
            log_warn!("SYNC", "refresh '{}': no engine sheet, cached results left as is", sheet.name);
            continue;
        };
        let formulas: Vec<(u32, u32)> = sheet.formula_cells().map(|(key, _)| key).collect();
        for (row, col) in formulas {
            let (r, c) = CellAddress::new(row, col).to_engine();
            let value = match engine.cell_value(id, r, c) {
                Ok(value) => value,
                Err(e) => {
                    log_warn!("SYNC", "refresh '{}': {}", sheet.name, e);
                    continue;
                }
            };
            if let Some(cell) = sheet.cell_mut(row, col) {
                cell.value = SavedCellValue::from_value(&value);
                refreshed += 1;
            }
        }
    }

    log_debug!("SYNC", "refreshed {} cached formula results", refreshed);
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{parse_range, parse_reference, EngineConfig};

    fn session() -> Session {
        Session::new(EngineConfig::default()).unwrap()
    }

    fn number(n: f64) -> SavedCell {
        SavedCell::literal(SavedCellValue::Number(n))
    }

    fn addr(text: &str) -> CellAddress {
        parse_reference(text).unwrap()
    }

    #[test]
    fn test_write_reaches_both_stores() {
        let mut session = session();
        write_cell(&mut session, "Sheet1", addr("B2"), number(4.0)).unwrap();

        assert_eq!(session.document.sheets[0].cell(2, 2), Some(&number(4.0)));
        let id = session.engine_sheet("Sheet1").unwrap();
        assert_eq!(session.engine.cell_value(id, 1, 1).unwrap(), CellValue::Number(4.0));
    }

    #[test]
    fn test_reads_use_calculated_values() {
        let mut session = session();
        write_cells(
            &mut session,
            "Sheet1",
            vec![
                (addr("A1"), number(5.0)),
                (addr("A2"), number(10.0)),
                (addr("A3"), SavedCell::formula("=SUM(A1:A2)")),
            ],
        )
        .unwrap();

        assert_eq!(read_value(&session, "Sheet1", addr("A3")), CellValue::Number(15.0));
        // the document cache stays stale until refreshed
        assert_eq!(session.document.sheets[0].cell(3, 1).unwrap().value, SavedCellValue::Empty);

        assert_eq!(sync_to_document(&mut session), 1);
        assert_eq!(
            session.document.sheets[0].cell(3, 1).unwrap().value,
            SavedCellValue::Number(15.0)
        );
    }

    #[test]
    fn test_missing_engine_sheet_falls_back_to_document() {
        let mut session = session();
        write_cell(&mut session, "Sheet1", addr("A1"), number(7.0)).unwrap();
        let id = session.engine_sheet("Sheet1").unwrap();
        session.engine.remove_sheet(id).unwrap();

        assert_eq!(read_value(&session, "Sheet1", addr("A1")), CellValue::Number(7.0));
        let range = parse_range("A1:B1").unwrap();
        assert_eq!(
            read_range(&session, "Sheet1", &range),
            vec![vec![CellValue::Number(7.0), CellValue::Empty]]
        );
    }

    #[test]
    fn test_full_sync_coerces_lossy_values() {
        let mut session = session();
        {
            let sheet = session.document.sheet_mut("Sheet1").unwrap();
            sheet.set_cell(1, 1, SavedCell::literal(SavedCellValue::Error("#N/A".to_string())));
            sheet.set_cell(2, 2, SavedCell::formula("=A1"));
        }
        sync_sheet_to_engine(&mut session, "Sheet1").unwrap();

        assert_eq!(read_value(&session, "Sheet1", addr("B2")), CellValue::Text("#N/A".to_string()));
    }

    #[test]
    fn test_full_sync_sends_only_stored_cells() {
        let mut session = session();
        {
            let sheet = session.document.sheet_mut("Sheet1").unwrap();
            sheet.set_cell(1, 1, number(2.0));
            sheet.set_cell(1_048_576, 16_384, SavedCell::formula("=A1*5"));
            sheet.set_cell(5, 5, SavedCell::empty());
        }
        sync_sheet_to_engine(&mut session, "Sheet1").unwrap();

        assert_eq!(
            read_value(&session, "Sheet1", addr("XFD1048576")),
            CellValue::Number(10.0)
        );
        assert_eq!(read_value(&session, "Sheet1", addr("E5")), CellValue::Empty);
        let id = session.engine_sheet("Sheet1").unwrap();
        let dims = session.engine.sheet_dimensions(id).unwrap();
        assert_eq!((dims.height, dims.width), (1_048_576, 16_384));
    }

    #[test]
    fn test_out_of_bounds_write_touches_neither_store() {
        let mut session = Session::new(EngineConfig {
            max_rows: 10,
            max_columns: 10,
        })
        .unwrap();
        let err = write_cell(&mut session, "Sheet1", addr("A11"), number(1.0)).unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
        assert!(session.document.sheets[0].cells.is_empty());
    }
}
