//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Abstract Syntax Tree for formula expressions.
//! CONTEXT: Produced by the parser, walked by the engine's evaluator.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: numbers, strings, booleans
//! - Cell references: A1, $B$2, Sheet1!A1, 'Sheet Name'!A1
//! - Ranges: A1:B10, Sheet1!A1:B10
//! - Whole-column ranges: A:A, Sheet1!B:D
//! - Binary operations: + - * / ^ & = <> < > <= >=
//! - Unary operations: negation, unary plus, postfix percent
//! - Function calls: SUM(A1:A10), IF(A1>0, "yes", "no")

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(Value),

    CellRef(CellReference),

    /// A rectangular range. The sheet prefix applies to both corners.
    Range {
        sheet: Option<String>,
        start: CellReference,
        end: CellReference,
    },

    /// Entire columns, e.g. `A:C`. Column letters are uppercase.
    ColumnRange {
        sheet: Option<String>,
        start_col: String,
        end_col: String,
    },

    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Function names are uppercase.
    FunctionCall { name: String, args: Vec<Expression> },
}

/// A single cell reference. Column letters are uppercase, row is 1-based.
/// Absolute markers (`$`) carry no meaning for evaluation and are dropped.
#[derive(Debug, PartialEq, Clone)]
pub struct CellReference {
    pub sheet: Option<String>,
    pub col: String,
    pub row: u32,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
}

/// Binary operators, lowest precedence group first.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    Concat,

    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Percent,
}

impl Expression {
    /// Returns true if the expression reads any cell.
    pub fn has_references(&self) -> bool {
        match self {
            Expression::Literal(_) => false,
            Expression::CellRef(_) | Expression::Range { .. } | Expression::ColumnRange { .. } => {
                true
            }
            Expression::BinaryOp { left, right, .. } => {
                left.has_references() || right.has_references()
            }
            Expression::UnaryOp { operand, .. } => operand.has_references(),
            Expression::FunctionCall { args, .. } => args.iter().any(Expression::has_references),
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
        };
        f.write_str(symbol)
    }
}
