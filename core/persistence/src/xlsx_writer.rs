//! FILENAME: core/persistence/src/xlsx_writer.rs
//! PURPOSE: Saves the document model as an .xlsx file.
//! CONTEXT: Formula cells are written with their cached result so other
//! readers see values without recalculating. Date-times are written as
//! serial numbers carrying a date number format.

use crate::dates::date_to_serial;
use crate::{PersistenceError, SavedCell, SavedCellValue, Sheet, Workbook};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};
use std::path::Path;

const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

pub fn save_xlsx(workbook: &Workbook, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format(DATE_TIME_FORMAT);

    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &date_format)?;
    }

    xlsx.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, date_format: &Format) -> Result<(), PersistenceError> {
    // Document keys are 1-based; the writer is 0-based.
    for (&(row, col), cell) in &sheet.cells {
        let (row, col) = (row - 1, (col - 1) as u16);

        if let Some(formula) = &cell.formula {
            let formula = Formula::new(formula).set_result(cached_result(cell));
            worksheet.write_formula(row, col, formula)?;
            continue;
        }

        match &cell.value {
            SavedCellValue::Empty => {}
            SavedCellValue::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            SavedCellValue::Text(s) | SavedCellValue::Error(s) => {
                worksheet.write_string(row, col, s)?;
            }
            SavedCellValue::Boolean(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            SavedCellValue::DateTime(dt) => {
                worksheet.write_number_with_format(row, col, date_to_serial(dt), date_format)?;
            }
        }
    }
    Ok(())
}

fn cached_result(cell: &SavedCell) -> String {
    match &cell.value {
        SavedCellValue::DateTime(dt) => date_to_serial(dt).to_string(),
        other => other.to_string(),
    }
}
