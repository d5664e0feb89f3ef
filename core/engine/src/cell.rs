//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single engine cell.
//! CONTEXT: Separates what the caller submitted (`CellContent`) from the
//! calculated result (`CellValue`). Formula text is parsed once on entry and
//! the AST is kept on the cell so recalculation never re-parses.

use parser::Expression;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the possible errors a cell can hold (e.g., #DIV/0!)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellError {
    Div0,     // Division by zero
    Ref,      // Invalid reference (unknown sheet, column overflow)
    Name,     // Unknown function name
    Value,    // Wrong type of argument
    Parse,    // Formula parsing error
    Circular, // Formula depends on itself
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CellError::Div0 => "#DIV/0!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Value => "#VALUE!",
            CellError::Parse => "#ERROR!",
            CellError::Circular => "#CYCLE!",
        };
        f.write_str(text)
    }
}

/// Represents the calculated result or raw data within a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Display form used for text coercion and grouping keys.
/// Whole numbers print without a decimal point.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// What a caller writes into a cell. Formula text includes the leading '='.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Formula(String),
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

/// The atomic unit of an engine sheet.
#[derive(Debug, Clone)]
pub struct Cell {
    pub content: CellContent,
    /// Parsed formula. None for literals and for formulas that failed to parse.
    pub expression: Option<Expression>,
    pub value: CellValue,
}

impl Cell {
    pub fn from_content(content: CellContent) -> Self {
        let (expression, value) = match &content {
            CellContent::Empty => (None, CellValue::Empty),
            CellContent::Number(n) => (None, CellValue::Number(*n)),
            CellContent::Text(s) => (None, CellValue::Text(s.clone())),
            CellContent::Boolean(b) => (None, CellValue::Boolean(*b)),
            CellContent::Formula(text) => match parser::parse(text) {
                Ok(expr) => (Some(expr), CellValue::Empty),
                Err(_) => (None, CellValue::Error(CellError::Parse)),
            },
        };
        Cell {
            content,
            expression,
            value,
        }
    }

    pub fn new_number(num: f64) -> Self {
        Self::from_content(CellContent::Number(num))
    }

    pub fn new_text(text: String) -> Self {
        Self::from_content(CellContent::Text(text))
    }

    pub fn new_formula(formula: String) -> Self {
        Self::from_content(CellContent::Formula(formula))
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula(_))
    }
}
