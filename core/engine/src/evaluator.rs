//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates formula ASTs to compute cell values.
//! CONTEXT: Recalculation is demand-driven. Each formula cell is evaluated at
//! most once per pass: a referenced formula is evaluated first (depth-first)
//! and its result memoized, so evaluation order always respects dependencies
//! without a separate graph. A cell re-entered while it is still being
//! evaluated is part of a cycle and yields #CYCLE!.
//!
//! SUPPORTED FEATURES:
//! - Literal evaluation: Numbers, Strings, Booleans
//! - Cell references, including cross-sheet (`Data!A1`, `'My Data'!A1`)
//! - Rectangular ranges and whole-column ranges (A:A, B:D)
//! - Binary operations: +, -, *, /, ^, &, =, <>, <, >, <=, >=
//! - Unary operations: negation, unary plus, percent
//! - Functions: see functions.rs

use crate::calc::EngineSheet;
use crate::cell::{format_number, Cell, CellError, CellValue};
use crate::coord::col_to_index;
use parser::{BinaryOperator, CellReference, Expression, UnaryOperator, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// (sheet position, zero-based row, zero-based col)
pub type CellKey = (usize, u32, u32);

/// Rectangles up to this many cells are walked cell by cell. Larger ones are
/// answered from the sparse cell map instead.
const DENSE_RANGE_LIMIT: u64 = 4096;

/// Zero-based, normalized corners of a rectangular reference.
#[derive(Debug, Clone, Copy)]
struct RangeBounds {
    min_row: u32,
    max_row: u32,
    min_col: u32,
    max_col: u32,
}

fn range_bounds(start: &CellReference, end: &CellReference) -> Option<RangeBounds> {
    let start_col = col_to_index(&start.col)?;
    let end_col = col_to_index(&end.col)?;
    Some(RangeBounds {
        min_row: start.row.min(end.row) - 1,
        max_row: start.row.max(end.row) - 1,
        min_col: start_col.min(end_col) - 1,
        max_col: start_col.max(end_col) - 1,
    })
}

/// Zero-based column span of a whole-column reference.
fn column_bounds(start_col: &str, end_col: &str) -> Option<(u32, u32)> {
    let start = col_to_index(start_col)?;
    let end = col_to_index(end_col)?;
    Some((start.min(end) - 1, start.max(end) - 1))
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    /// A reference to a cell with no content.
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
    /// Range expansion. Aggregate functions receive this for range arguments.
    Array(Vec<EvalResult>),
}

impl EvalResult {
    pub fn from_cell_value(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => EvalResult::Empty,
            CellValue::Number(n) => EvalResult::Number(*n),
            CellValue::Text(s) => EvalResult::Text(s.clone()),
            CellValue::Boolean(b) => EvalResult::Boolean(*b),
            CellValue::Error(e) => EvalResult::Error(*e),
        }
    }

    /// Converts a top-level formula result to a stored value.
    /// A formula that only points at an empty cell shows 0.
    pub fn into_cell_value(self) -> CellValue {
        match self.into_scalar() {
            EvalResult::Empty => CellValue::Number(0.0),
            EvalResult::Number(n) => CellValue::Number(n),
            EvalResult::Text(s) => CellValue::Text(s),
            EvalResult::Boolean(b) => CellValue::Boolean(b),
            EvalResult::Error(e) => CellValue::Error(e),
            EvalResult::Array(_) => CellValue::Empty,
        }
    }

    /// Arrays collapse to their first element when used as a single value.
    pub fn into_scalar(self) -> EvalResult {
        match self {
            EvalResult::Array(items) => items
                .into_iter()
                .next()
                .map(EvalResult::into_scalar)
                .unwrap_or(EvalResult::Empty),
            other => other,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalResult::Empty => Some(0.0),
            EvalResult::Number(n) => Some(*n),
            EvalResult::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            EvalResult::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            EvalResult::Empty => Some(false),
            EvalResult::Boolean(b) => Some(*b),
            EvalResult::Number(n) => Some(*n != 0.0),
            EvalResult::Text(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            EvalResult::Text(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            EvalResult::Empty => String::new(),
            EvalResult::Number(n) => format_number(*n),
            EvalResult::Text(s) => s.clone(),
            EvalResult::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            EvalResult::Error(e) => e.to_string(),
            EvalResult::Array(items) => items.first().map(EvalResult::as_text).unwrap_or_default(),
        }
    }

    /// Flattens an array result into individual values.
    pub fn flatten(self) -> Vec<EvalResult> {
        match self {
            EvalResult::Array(items) => items.into_iter().flat_map(EvalResult::flatten).collect(),
            other => vec![other],
        }
    }

    /// Excel orders mixed types as numbers < text < booleans.
    fn type_rank(&self) -> u8 {
        match self {
            EvalResult::Number(_) | EvalResult::Empty => 0,
            EvalResult::Text(_) => 1,
            EvalResult::Boolean(_) => 2,
            EvalResult::Error(_) | EvalResult::Array(_) => 3,
        }
    }

    /// The value an empty cell takes when compared against `self`.
    fn blank_counterpart(&self) -> EvalResult {
        match self {
            EvalResult::Text(_) => EvalResult::Text(String::new()),
            EvalResult::Boolean(_) => EvalResult::Boolean(false),
            _ => EvalResult::Number(0.0),
        }
    }
}

/// One recalculation pass over a set of sheets.
pub struct Evaluator<'a> {
    sheets: &'a [EngineSheet],
    /// Sheet that unqualified references resolve against.
    current_sheet: usize,
    results: HashMap<CellKey, CellValue>,
    in_progress: HashSet<CellKey>,
}

impl<'a> Evaluator<'a> {
    pub fn new(sheets: &'a [EngineSheet]) -> Self {
        Evaluator {
            sheets,
            current_sheet: 0,
            results: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Returns the value of a cell, evaluating its formula first if needed.
    pub fn value_at(&mut self, key: CellKey) -> CellValue {
        if let Some(value) = self.results.get(&key) {
            return value.clone();
        }
        let Some(cell) = self.cell(key) else {
            return CellValue::Empty;
        };
        if cell.expression.is_none() {
            return cell.value.clone();
        }
        if self.in_progress.contains(&key) {
            return CellValue::Error(CellError::Circular);
        }

        self.resolve(key);
        self.results.get(&key).cloned().unwrap_or(CellValue::Empty)
    }

    /// Formula results computed during this pass.
    pub fn into_results(self) -> HashMap<CellKey, CellValue> {
        self.results
    }

    fn cell(&self, key: CellKey) -> Option<&'a Cell> {
        let sheets = self.sheets;
        let (sheet, row, col) = key;
        sheets.get(sheet).and_then(|s| s.grid.get_cell(row, col))
    }

    /// Evaluates `root` after every formula it reaches, dependencies first.
    /// The walk runs on an explicit work stack, so the depth of a reference
    /// chain never grows the call stack. A key stays in `in_progress` from
    /// expansion until its own evaluation, which is what flags cycles.
    fn resolve(&mut self, root: CellKey) {
        let mut pending: Vec<(CellKey, bool)> = vec![(root, false)];
        while let Some((key, expanded)) = pending.pop() {
            if expanded {
                self.evaluate_formula(key);
                continue;
            }
            if self.results.contains_key(&key) || !self.in_progress.insert(key) {
                continue;
            }

            pending.push((key, true));
            for dep in self.formula_dependencies(key) {
                if !self.results.contains_key(&dep) && !self.in_progress.contains(&dep) {
                    pending.push((dep, false));
                }
            }
        }
    }

    /// Evaluates one formula cell. Its formula dependencies are already
    /// memoized or in progress, so references resolve without descending.
    fn evaluate_formula(&mut self, key: CellKey) {
        let value = match self.cell(key).and_then(|cell| cell.expression.as_ref()) {
            Some(expr) => {
                let outer_sheet = std::mem::replace(&mut self.current_sheet, key.0);
                let value = self.evaluate(expr).into_cell_value();
                self.current_sheet = outer_sheet;
                value
            }
            None => CellValue::Empty,
        };
        self.in_progress.remove(&key);
        self.results.insert(key, value);
    }

    pub fn evaluate(&mut self, expr: &Expression) -> EvalResult {
        match expr {
            Expression::Literal(value) => match value {
                Value::Number(n) => EvalResult::Number(*n),
                Value::String(s) => EvalResult::Text(s.clone()),
                Value::Boolean(b) => EvalResult::Boolean(*b),
            },
            Expression::CellRef(reference) => self.eval_cell_ref(reference),
            Expression::Range { sheet, start, end } => self.eval_range(sheet.as_deref(), start, end),
            Expression::ColumnRange {
                sheet,
                start_col,
                end_col,
            } => self.eval_column_range(sheet.as_deref(), start_col, end_col),
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, *op, right),
            Expression::UnaryOp { op, operand } => self.eval_unary_op(*op, operand),
            Expression::FunctionCall { name, args } => self.call_function(name, args),
        }
    }

    // ========================================================================
    // DEPENDENCIES
    // ========================================================================

    /// Formula cells referenced by the formula at `key`.
    fn formula_dependencies(&self, key: CellKey) -> Vec<CellKey> {
        let mut deps = Vec::new();
        if let Some(expr) = self.cell(key).and_then(|cell| cell.expression.as_ref()) {
            self.collect_references(key.0, expr, &mut deps);
        }
        deps
    }

    fn collect_references(&self, current: usize, expr: &Expression, deps: &mut Vec<CellKey>) {
        match expr {
            Expression::Literal(_) => {}
            Expression::CellRef(reference) => {
                let Some(sheet) = self.sheet_position(current, reference.sheet.as_deref()) else {
                    return;
                };
                if let Some(col) = col_to_index(&reference.col) {
                    self.push_formula(deps, (sheet, reference.row - 1, col - 1));
                }
            }
            Expression::Range { sheet, start, end } => {
                let Some(sheet) = self.sheet_position(current, sheet.as_deref()) else {
                    return;
                };
                if let Some(bounds) = range_bounds(start, end) {
                    for (r, c) in self.range_positions(sheet, bounds) {
                        self.push_formula(deps, (sheet, r, c));
                    }
                }
            }
            Expression::ColumnRange {
                sheet,
                start_col,
                end_col,
            } => {
                let Some(sheet) = self.sheet_position(current, sheet.as_deref()) else {
                    return;
                };
                if let Some((min_col, max_col)) = column_bounds(start_col, end_col) {
                    for (r, c) in self.column_positions(sheet, min_col, max_col) {
                        self.push_formula(deps, (sheet, r, c));
                    }
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                self.collect_references(current, left, deps);
                self.collect_references(current, right, deps);
            }
            Expression::UnaryOp { operand, .. } => self.collect_references(current, operand, deps),
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    self.collect_references(current, arg, deps);
                }
            }
        }
    }

    fn push_formula(&self, deps: &mut Vec<CellKey>, key: CellKey) {
        if self.cell(key).is_some_and(|cell| cell.expression.is_some()) {
            deps.push(key);
        }
    }

    // ========================================================================
    // REFERENCES
    // ========================================================================

    /// Sheet lookup for a reference prefix. Exact name first, then
    /// case-insensitive, as users type sheet names loosely in formulas.
    fn sheet_position(&self, current: usize, sheet: Option<&str>) -> Option<usize> {
        let Some(name) = sheet else {
            return Some(current);
        };
        self.sheets
            .iter()
            .position(|s| s.name == name)
            .or_else(|| {
                self.sheets
                    .iter()
                    .position(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    fn resolve_sheet(&self, sheet: Option<&str>) -> Option<usize> {
        self.sheet_position(self.current_sheet, sheet)
    }

    fn reference_value(&mut self, sheet: usize, row: u32, col: u32) -> EvalResult {
        EvalResult::from_cell_value(&self.value_at((sheet, row, col)))
    }

    fn eval_cell_ref(&mut self, reference: &CellReference) -> EvalResult {
        let Some(sheet) = self.resolve_sheet(reference.sheet.as_deref()) else {
            return EvalResult::Error(CellError::Ref);
        };
        let Some(col) = col_to_index(&reference.col) else {
            return EvalResult::Error(CellError::Ref);
        };
        self.reference_value(sheet, reference.row - 1, col - 1)
    }

    /// Row-major cell positions inside a rectangle. Small rectangles are
    /// walked cell by cell; larger ones come from the sparse cell map.
    fn range_positions(&self, sheet: usize, bounds: RangeBounds) -> Vec<(u32, u32)> {
        let RangeBounds {
            min_row,
            max_row,
            min_col,
            max_col,
        } = bounds;
        let area = (max_row - min_row + 1) as u64 * (max_col - min_col + 1) as u64;
        let grid = &self.sheets[sheet].grid;

        if area <= DENSE_RANGE_LIMIT || area <= grid.len() as u64 {
            (min_row..=max_row)
                .flat_map(|r| (min_col..=max_col).map(move |c| (r, c)))
                .collect()
        } else {
            let mut positions: Vec<(u32, u32)> = grid
                .cells
                .keys()
                .filter(|(r, c)| (min_row..=max_row).contains(r) && (min_col..=max_col).contains(c))
                .copied()
                .collect();
            positions.sort_unstable();
            positions
        }
    }

    /// Stored cell positions in whole columns, column by column.
    fn column_positions(&self, sheet: usize, min_col: u32, max_col: u32) -> Vec<(u32, u32)> {
        let mut positions: Vec<(u32, u32)> = self.sheets[sheet]
            .grid
            .cells
            .keys()
            .filter(|(_, c)| (min_col..=max_col).contains(c))
            .map(|&(r, c)| (c, r))
            .collect();
        positions.sort_unstable();
        positions.into_iter().map(|(c, r)| (r, c)).collect()
    }

    fn eval_range(
        &mut self,
        sheet: Option<&str>,
        start: &CellReference,
        end: &CellReference,
    ) -> EvalResult {
        let Some(sheet) = self.resolve_sheet(sheet) else {
            return EvalResult::Error(CellError::Ref);
        };
        let Some(bounds) = range_bounds(start, end) else {
            return EvalResult::Error(CellError::Ref);
        };

        let values = self
            .range_positions(sheet, bounds)
            .into_iter()
            .map(|(r, c)| self.reference_value(sheet, r, c))
            .collect();
        EvalResult::Array(values)
    }

    fn eval_column_range(&mut self, sheet: Option<&str>, start_col: &str, end_col: &str) -> EvalResult {
        let Some(sheet) = self.resolve_sheet(sheet) else {
            return EvalResult::Error(CellError::Ref);
        };
        let Some((min_col, max_col)) = column_bounds(start_col, end_col) else {
            return EvalResult::Error(CellError::Ref);
        };

        let values = self
            .column_positions(sheet, min_col, max_col)
            .into_iter()
            .map(|(r, c)| self.reference_value(sheet, r, c))
            .collect();
        EvalResult::Array(values)
    }

    // ========================================================================
    // OPERATORS
    // ========================================================================

    fn eval_binary_op(&mut self, left: &Expression, op: BinaryOperator, right: &Expression) -> EvalResult {
        let left = self.evaluate(left).into_scalar();
        let right = self.evaluate(right).into_scalar();

        if let EvalResult::Error(e) = left {
            return EvalResult::Error(e);
        }
        if let EvalResult::Error(e) = right {
            return EvalResult::Error(e);
        }

        match op {
            BinaryOperator::Add => arithmetic(&left, &right, |l, r| EvalResult::Number(l + r)),
            BinaryOperator::Subtract => arithmetic(&left, &right, |l, r| EvalResult::Number(l - r)),
            BinaryOperator::Multiply => arithmetic(&left, &right, |l, r| EvalResult::Number(l * r)),
            BinaryOperator::Divide => arithmetic(&left, &right, |l, r| {
                if r == 0.0 {
                    EvalResult::Error(CellError::Div0)
                } else {
                    EvalResult::Number(l / r)
                }
            }),
            BinaryOperator::Power => arithmetic(&left, &right, |l, r| {
                let result = l.powf(r);
                if result.is_finite() {
                    EvalResult::Number(result)
                } else {
                    EvalResult::Error(CellError::Value)
                }
            }),
            BinaryOperator::Concat => EvalResult::Text(left.as_text() + &right.as_text()),
            comparison => match compare(&left, &right) {
                Some(ordering) => EvalResult::Boolean(match comparison {
                    BinaryOperator::Equal => ordering == Ordering::Equal,
                    BinaryOperator::NotEqual => ordering != Ordering::Equal,
                    BinaryOperator::LessThan => ordering == Ordering::Less,
                    BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                    BinaryOperator::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }),
                None => EvalResult::Error(CellError::Value),
            },
        }
    }

    fn eval_unary_op(&mut self, op: UnaryOperator, operand: &Expression) -> EvalResult {
        let value = self.evaluate(operand).into_scalar();
        if let EvalResult::Error(e) = value {
            return EvalResult::Error(e);
        }

        match op {
            UnaryOperator::Plus => value,
            UnaryOperator::Negate => match value.as_number() {
                Some(n) => EvalResult::Number(-n),
                None => EvalResult::Error(CellError::Value),
            },
            UnaryOperator::Percent => match value.as_number() {
                Some(n) => EvalResult::Number(n / 100.0),
                None => EvalResult::Error(CellError::Value),
            },
        }
    }
}

fn arithmetic(left: &EvalResult, right: &EvalResult, op: impl Fn(f64, f64) -> EvalResult) -> EvalResult {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => op(l, r),
        _ => EvalResult::Error(CellError::Value),
    }
}

/// Text compares case-insensitively. Empty takes the blank form of the other side.
fn compare(left: &EvalResult, right: &EvalResult) -> Option<Ordering> {
    match (left, right) {
        (EvalResult::Empty, EvalResult::Empty) => Some(Ordering::Equal),
        (EvalResult::Empty, other) => compare(&other.blank_counterpart(), other),
        (other, EvalResult::Empty) => compare(other, &other.blank_counterpart()),
        (EvalResult::Number(l), EvalResult::Number(r)) => l.partial_cmp(r),
        (EvalResult::Text(l), EvalResult::Text(r)) => Some(l.to_lowercase().cmp(&r.to_lowercase())),
        (EvalResult::Boolean(l), EvalResult::Boolean(r)) => Some(l.cmp(r)),
        (l, r) => Some(l.type_rank().cmp(&r.type_rank())),
    }
}
