//! FILENAME: core/engine/src/calc.rs
//! PURPOSE: The calculation engine facade.
//! CONTEXT: Holds named sheets of zero-based cells, addressed by `SheetId`.
//! Every mutating call ends with a synchronous recalculation, so a value read
//! right after a write always reflects it.

use crate::cell::{Cell, CellContent, CellValue};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::grid::Grid;
use serde::{Deserialize, Serialize};

/// Stable identifier of an engine sheet. Never reused within an engine.
pub type SheetId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct EngineSheet {
    pub id: SheetId,
    pub name: String,
    pub grid: Grid,
}

#[derive(Debug)]
pub struct CalcEngine {
    config: EngineConfig,
    sheets: Vec<EngineSheet>,
    next_sheet_id: SheetId,
}

impl CalcEngine {
    pub fn new(config: EngineConfig) -> Self {
        CalcEngine {
            config,
            sheets: Vec::new(),
            next_sheet_id: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // SHEETS
    // ========================================================================

    pub fn add_sheet(&mut self, name: &str) -> Result<SheetId, EngineError> {
        if name.is_empty() {
            return Err(EngineError::EmptySheetName);
        }
        if self.sheet_id(name).is_some() {
            return Err(EngineError::DuplicateSheet(name.to_string()));
        }

        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        self.sheets.push(EngineSheet {
            id,
            name: name.to_string(),
            grid: Grid::new(),
        });

        // Formulas that named this sheet before it existed now resolve
        self.recalculate();
        Ok(id)
    }

    pub fn remove_sheet(&mut self, id: SheetId) -> Result<(), EngineError> {
        let index = self.sheet_index(id)?;
        self.sheets.remove(index);
        self.recalculate();
        Ok(())
    }

    /// Renames a sheet. Formulas keep their text, so references spelled with
    /// the old name stop resolving.
    pub fn rename_sheet(&mut self, id: SheetId, name: &str) -> Result<(), EngineError> {
        if name.is_empty() {
            return Err(EngineError::EmptySheetName);
        }
        let index = self.sheet_index(id)?;
        if self
            .sheets
            .iter()
            .any(|s| s.id != id && s.name == name)
        {
            return Err(EngineError::DuplicateSheet(name.to_string()));
        }

        self.sheets[index].name = name.to_string();
        self.recalculate();
        Ok(())
    }

    pub fn sheet_id(&self, name: &str) -> Option<SheetId> {
        self.sheets.iter().find(|s| s.name == name).map(|s| s.id)
    }

    pub fn sheet_name(&self, id: SheetId) -> Option<&str> {
        self.sheets
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet_index(&self, id: SheetId) -> Result<usize, EngineError> {
        self.sheets
            .iter()
            .position(|s| s.id == id)
            .ok_or(EngineError::SheetNotFound(id))
    }

    // ========================================================================
    // CELLS
    // ========================================================================

    pub fn set_cell_content(
        &mut self,
        id: SheetId,
        row: u32,
        col: u32,
        content: CellContent,
    ) -> Result<(), EngineError> {
        self.set_cell_contents(id, [(row, col, content)]).map(|_| ())
    }

    /// Applies a batch of writes with a single recalculation. Bounds are
    /// checked for the whole batch before anything is written.
    pub fn set_cell_contents<I>(&mut self, id: SheetId, cells: I) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = (u32, u32, CellContent)>,
    {
        let index = self.sheet_index(id)?;
        let cells: Vec<(u32, u32, CellContent)> = cells.into_iter().collect();
        for (row, col, _) in &cells {
            self.check_bounds(*row, *col)?;
        }

        let written = cells.len();
        let grid = &mut self.sheets[index].grid;
        for (row, col, content) in cells {
            write_cell(grid, row, col, content);
        }

        self.recalculate();
        Ok(written)
    }

    /// Replaces the whole content of a sheet. Positions not listed end up
    /// empty, so callers pass only the cells that hold something. Bounds are
    /// checked for every cell before the sheet is cleared.
    pub fn set_sheet_content<I>(&mut self, id: SheetId, cells: I) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = (u32, u32, CellContent)>,
    {
        let index = self.sheet_index(id)?;
        let cells: Vec<(u32, u32, CellContent)> = cells.into_iter().collect();
        for (row, col, _) in &cells {
            self.check_bounds(*row, *col)?;
        }

        let grid = &mut self.sheets[index].grid;
        grid.clear();
        let written = cells.len();
        for (row, col, content) in cells {
            write_cell(grid, row, col, content);
        }

        self.recalculate();
        Ok(written)
    }

    pub fn cell_value(&self, id: SheetId, row: u32, col: u32) -> Result<CellValue, EngineError> {
        let index = self.sheet_index(id)?;
        Ok(self.sheets[index]
            .grid
            .get_cell(row, col)
            .map(|cell| cell.value.clone())
            .unwrap_or(CellValue::Empty))
    }

    pub fn sheet_dimensions(&self, id: SheetId) -> Result<SheetDimensions, EngineError> {
        let index = self.sheet_index(id)?;
        let (height, width) = self.sheets[index].grid.extent();
        Ok(SheetDimensions { width, height })
    }

    fn check_bounds(&self, row: u32, col: u32) -> Result<(), EngineError> {
        if row >= self.config.max_rows || col >= self.config.max_columns {
            return Err(EngineError::OutOfBounds {
                row,
                col,
                max_rows: self.config.max_rows,
                max_columns: self.config.max_columns,
            });
        }
        Ok(())
    }

    // ========================================================================
    // CALCULATION
    // ========================================================================

    /// Re-evaluates every formula in every sheet. Returns the number of
    /// formula cells evaluated.
    pub fn recalculate(&mut self) -> usize {
        let pending: Vec<(usize, u32, u32)> = self
            .sheets
            .iter()
            .enumerate()
            .flat_map(|(s, sheet)| sheet.grid.formula_cells().map(move |(r, c)| (s, r, c)))
            .collect();

        let mut evaluator = Evaluator::new(&self.sheets);
        for key in &pending {
            evaluator.value_at(*key);
        }
        let results = evaluator.into_results();

        for ((s, r, c), value) in results {
            if let Some(cell) = self.sheets[s].grid.cells.get_mut(&(r, c)) {
                cell.value = value;
            }
        }

        pending.len()
    }

    /// Releases every sheet held by this engine.
    pub fn destroy(mut self) {
        self.sheets.clear();
    }
}

fn write_cell(grid: &mut Grid, row: u32, col: u32, content: CellContent) {
    if content.is_empty() {
        grid.clear_cell(row, col);
    } else {
        grid.set_cell(row, col, Cell::from_content(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellError;

    fn engine() -> (CalcEngine, SheetId) {
        let mut engine = CalcEngine::new(EngineConfig::default());
        let id = engine.add_sheet("Sheet1").unwrap();
        (engine, id)
    }

    fn formula(text: &str) -> CellContent {
        CellContent::Formula(text.to_string())
    }

    #[test]
    fn recalculates_after_each_write() {
        let (mut engine, id) = engine();
        engine.set_cell_content(id, 0, 0, CellContent::Number(5.0)).unwrap();
        engine.set_cell_content(id, 1, 0, CellContent::Number(10.0)).unwrap();
        engine.set_cell_content(id, 2, 0, formula("=SUM(A1:A2)")).unwrap();
        assert_eq!(engine.cell_value(id, 2, 0).unwrap(), CellValue::Number(15.0));

        engine.set_cell_content(id, 0, 0, CellContent::Number(7.0)).unwrap();
        assert_eq!(engine.cell_value(id, 2, 0).unwrap(), CellValue::Number(17.0));
    }

    #[test]
    fn batch_write_counts_cells() {
        let (mut engine, id) = engine();
        let written = engine
            .set_cell_contents(
                id,
                vec![
                    (0, 0, CellContent::Number(2.0)),
                    (0, 1, CellContent::Number(3.0)),
                    (0, 2, formula("=A1*B1")),
                ],
            )
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(engine.cell_value(id, 0, 2).unwrap(), CellValue::Number(6.0));
    }

    #[test]
    fn empty_content_clears_cell() {
        let (mut engine, id) = engine();
        engine.set_cell_content(id, 3, 3, CellContent::Text("x".to_string())).unwrap();
        assert_eq!(
            engine.sheet_dimensions(id).unwrap(),
            SheetDimensions { width: 4, height: 4 }
        );
        engine.set_cell_content(id, 3, 3, CellContent::Empty).unwrap();
        assert_eq!(engine.cell_value(id, 3, 3).unwrap(), CellValue::Empty);
        assert_eq!(
            engine.sheet_dimensions(id).unwrap(),
            SheetDimensions { width: 0, height: 0 }
        );
    }

    #[test]
    fn set_sheet_content_replaces_everything() {
        let (mut engine, id) = engine();
        engine.set_cell_content(id, 9, 9, CellContent::Number(1.0)).unwrap();
        engine
            .set_sheet_content(
                id,
                vec![
                    (0, 0, CellContent::Number(1.0)),
                    (0, 1, CellContent::Empty),
                    (1, 0, CellContent::Number(2.0)),
                    (1, 1, formula("=A1+A2")),
                ],
            )
            .unwrap();
        assert_eq!(engine.cell_value(id, 9, 9).unwrap(), CellValue::Empty);
        assert_eq!(engine.cell_value(id, 1, 1).unwrap(), CellValue::Number(3.0));
        assert_eq!(
            engine.sheet_dimensions(id).unwrap(),
            SheetDimensions { width: 2, height: 2 }
        );
    }

    #[test]
    fn set_sheet_content_at_the_far_corner() {
        let (mut engine, id) = engine();
        let limits = EngineConfig::default();
        engine
            .set_sheet_content(
                id,
                vec![
                    (0, 0, CellContent::Number(2.0)),
                    (limits.max_rows - 1, limits.max_columns - 1, formula("=A1*3")),
                ],
            )
            .unwrap();
        assert_eq!(
            engine
                .cell_value(id, limits.max_rows - 1, limits.max_columns - 1)
                .unwrap(),
            CellValue::Number(6.0)
        );
        assert_eq!(
            engine.sheet_dimensions(id).unwrap(),
            SheetDimensions {
                width: limits.max_columns,
                height: limits.max_rows
            }
        );
    }

    #[test]
    fn sheet_lifecycle() {
        let (mut engine, first) = engine();
        let second = engine.add_sheet("Data").unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.sheet_id("Data"), Some(second));
        assert_eq!(
            engine.add_sheet("Data"),
            Err(EngineError::DuplicateSheet("Data".to_string()))
        );

        engine.rename_sheet(second, "Facts").unwrap();
        assert_eq!(engine.sheet_id("Data"), None);
        assert_eq!(engine.sheet_name(second), Some("Facts"));

        engine.remove_sheet(second).unwrap();
        assert_eq!(engine.sheet_count(), 1);
        assert_eq!(
            engine.cell_value(second, 0, 0),
            Err(EngineError::SheetNotFound(second))
        );

        // Ids are never reused
        let third = engine.add_sheet("Data").unwrap();
        assert_ne!(third, second);
    }

    #[test]
    fn cross_sheet_formulas_follow_sheet_changes() {
        let (mut engine, summary) = engine();
        engine.set_cell_content(summary, 0, 0, formula("=Data!A1*2")).unwrap();
        assert_eq!(
            engine.cell_value(summary, 0, 0).unwrap(),
            CellValue::Error(CellError::Ref)
        );

        let data = engine.add_sheet("Data").unwrap();
        engine.set_cell_content(data, 0, 0, CellContent::Number(21.0)).unwrap();
        assert_eq!(engine.cell_value(summary, 0, 0).unwrap(), CellValue::Number(42.0));

        engine.rename_sheet(data, "Renamed").unwrap();
        assert_eq!(
            engine.cell_value(summary, 0, 0).unwrap(),
            CellValue::Error(CellError::Ref)
        );
    }

    #[test]
    fn rejects_cells_outside_limits() {
        let mut engine = CalcEngine::new(EngineConfig {
            max_rows: 10,
            max_columns: 5,
        });
        let id = engine.add_sheet("Small").unwrap();
        assert!(matches!(
            engine.set_cell_content(id, 10, 0, CellContent::Number(1.0)),
            Err(EngineError::OutOfBounds { .. })
        ));
        // Nothing from a rejected batch is applied
        let result = engine.set_cell_contents(
            id,
            vec![
                (0, 0, CellContent::Number(1.0)),
                (0, 5, CellContent::Number(2.0)),
            ],
        );
        assert!(result.is_err());
        assert_eq!(engine.cell_value(id, 0, 0).unwrap(), CellValue::Empty);
    }

    #[test]
    fn long_dependency_chain_evaluates() {
        let (mut engine, id) = engine();
        let links: u32 = 50_000;
        let mut cells = vec![(0, 0, CellContent::Number(1.0))];
        cells.extend((1..links).map(|r| (r, 0, formula(&format!("=A{}+1", r)))));
        engine.set_cell_contents(id, cells).unwrap();

        assert_eq!(
            engine.cell_value(id, links - 1, 0).unwrap(),
            CellValue::Number(links as f64)
        );

        // A change at the head reaches the tail
        engine.set_cell_content(id, 0, 0, CellContent::Number(10.0)).unwrap();
        assert_eq!(
            engine.cell_value(id, links - 1, 0).unwrap(),
            CellValue::Number((links + 9) as f64)
        );
    }

    #[test]
    fn cycle_at_the_end_of_a_chain() {
        let (mut engine, id) = engine();
        engine
            .set_cell_contents(
                id,
                vec![
                    (0, 0, formula("=A2")),
                    (1, 0, formula("=A3")),
                    (2, 0, formula("=A1")),
                    (0, 1, formula("=A1+1")),
                ],
            )
            .unwrap();
        for row in 0..3 {
            assert_eq!(
                engine.cell_value(id, row, 0).unwrap(),
                CellValue::Error(CellError::Circular)
            );
        }
        assert_eq!(
            engine.cell_value(id, 0, 1).unwrap(),
            CellValue::Error(CellError::Circular)
        );
    }

    #[test]
    fn recalculate_reports_formula_count() {
        let (mut engine, id) = engine();
        engine.set_cell_content(id, 0, 0, formula("=1+1")).unwrap();
        engine.set_cell_content(id, 0, 1, formula("=A1*3")).unwrap();
        engine.set_cell_content(id, 0, 2, CellContent::Number(4.0)).unwrap();
        assert_eq!(engine.recalculate(), 2);
        assert_eq!(engine.cell_value(id, 0, 1).unwrap(), CellValue::Number(6.0));
    }
}
