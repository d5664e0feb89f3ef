//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the formula parser.
//! CONTEXT: Converts formula text into expression trees for the calculation engine.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST --> Evaluator

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{BinaryOperator, CellReference, Expression, UnaryOperator, Value};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use token::Token;
