//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//!
//! GRAMMAR:
//!   expression     --> comparison
//!   comparison     --> concatenation ( ("=" | "<>" | "<" | ">" | "<=" | ">=") concatenation )*
//!   concatenation  --> additive ( "&" additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("-" | "+") unary | power
//!   power          --> postfix ( "^" unary )?
//!   postfix        --> primary "%"*
//!   primary        --> NUMBER | STRING | BOOLEAN | reference | function_call | "(" expression ")"
//!   reference      --> [sheet_prefix] IDENTIFIER (":" IDENTIFIER)?
//!   sheet_prefix   --> (IDENTIFIER | QUOTED_IDENTIFIER) "!"
//!   function_call  --> IDENTIFIER "(" (expression ("," expression)*)? ")"

use crate::ast::{BinaryOperator, CellReference, Expression, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::Token;

#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input. A single leading '=' is accepted and skipped.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::Equals {
            self.advance();
        }

        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_comparison()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {}, found {}",
                expected, self.current_token
            )))
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token {
                Token::Equals => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_concatenation()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;

        while self.current_token == Token::Ampersand {
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, BinaryOperator::Concat, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> ParseResult<Expression> {
        let left = self.parse_postfix()?;

        if self.current_token == Token::Caret {
            self.advance();
            let right = self.parse_unary()?;
            return Ok(binary(left, BinaryOperator::Power, right));
        }

        Ok(left)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        while self.current_token == Token::Percent {
            self.advance();
            expr = Expression::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(b)))
            }
            Token::QuotedIdentifier(sheet) => {
                self.advance();
                self.expect(Token::Exclamation)?;
                self.parse_sheet_reference(sheet)
            }
            Token::Identifier(name) => {
                self.advance();
                match self.current_token {
                    Token::Exclamation => {
                        self.advance();
                        self.parse_sheet_reference(name)
                    }
                    Token::LParen => self.parse_function_call(name.to_ascii_uppercase()),
                    Token::Colon => self.parse_range(None, &name),
                    _ => Ok(Expression::CellRef(split_cell_reference(None, &name)?)),
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_comparison()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::EOF => Err(ParseError::new("Unexpected end of expression")),
            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),
            token => Err(ParseError::new(format!("Unexpected token: {}", token))),
        }
    }

    /// Parses the reference that follows `Sheet!`.
    fn parse_sheet_reference(&mut self, sheet: String) -> ParseResult<Expression> {
        let Token::Identifier(name) = self.current_token.clone() else {
            return Err(ParseError::new(format!(
                "Expected cell reference after '!', found {}",
                self.current_token
            )));
        };
        self.advance();

        if self.current_token == Token::Colon {
            self.parse_range(Some(sheet), &name)
        } else {
            Ok(Expression::CellRef(split_cell_reference(Some(sheet), &name)?))
        }
    }

    /// Parses `start:end` once `start` and the current ':' have been seen.
    fn parse_range(&mut self, sheet: Option<String>, start: &str) -> ParseResult<Expression> {
        self.advance();

        let end = match self.current_token.clone() {
            Token::Identifier(name) => {
                self.advance();
                name
            }
            other => {
                return Err(ParseError::new(format!(
                    "Expected reference after ':', found {}",
                    other
                )))
            }
        };

        let start_letters = strip_absolute(start);
        let end_letters = strip_absolute(&end);
        let is_column = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic());

        if is_column(&start_letters) && is_column(&end_letters) {
            return Ok(Expression::ColumnRange {
                sheet,
                start_col: start_letters.to_ascii_uppercase(),
                end_col: end_letters.to_ascii_uppercase(),
            });
        }

        Ok(Expression::Range {
            start: split_cell_reference(None, start)?,
            end: split_cell_reference(None, &end)?,
            sheet,
        })
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<Expression> {
        self.advance();

        let mut args = Vec::new();
        if self.current_token == Token::RParen {
            self.advance();
            return Ok(Expression::FunctionCall { name, args });
        }

        args.push(self.parse_comparison()?);
        while self.current_token == Token::Comma {
            self.advance();
            args.push(self.parse_comparison()?);
        }
        self.expect(Token::RParen)?;

        Ok(Expression::FunctionCall { name, args })
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn strip_absolute(identifier: &str) -> String {
    identifier.chars().filter(|c| *c != '$').collect()
}

/// Splits "A1", "$AA$100" into uppercase column letters and a 1-based row.
fn split_cell_reference(sheet: Option<String>, identifier: &str) -> ParseResult<CellReference> {
    let plain = strip_absolute(identifier);
    let split = plain
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(plain.len());
    let (letters, digits) = plain.split_at(split);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ParseError::new(format!("Unknown name: {}", identifier)));
    }
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::new(format!("Unknown name: {}", identifier)));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| ParseError::new(format!("Row number out of range: {}", identifier)))?;
    if row == 0 {
        return Err(ParseError::new(format!("Row number must be >= 1: {}", identifier)));
    }

    Ok(CellReference {
        sheet,
        col: letters.to_ascii_uppercase(),
        row,
    })
}

/// Convenience function to parse a formula string directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}
