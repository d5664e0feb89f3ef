//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Token definitions for the formula lexer.

/// Tokens recognized by the formula lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    /// Bare word: function name, cell reference (`A1`, `$B$2`) or sheet name.
    /// The original spelling is preserved; the parser normalizes case.
    Identifier(String),
    /// Quoted sheet name: 'Sheet Name'
    QuotedIdentifier(String),

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,
    Ampersand,
    Percent,
    Equals,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LParen,
    RParen,
    Comma,
    Colon,
    Exclamation,

    EOF,
    Illegal(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Token::Number(n) => return write!(f, "{}", n),
            Token::String(s) => return write!(f, "\"{}\"", s),
            Token::Boolean(b) => return write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Token::Identifier(s) => return write!(f, "{}", s),
            Token::QuotedIdentifier(s) => return write!(f, "'{}'", s),
            Token::Illegal(c) => return write!(f, "ILLEGAL({})", c),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Caret => "^",
            Token::Ampersand => "&",
            Token::Percent => "%",
            Token::Equals => "=",
            Token::NotEqual => "<>",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Exclamation => "!",
            Token::EOF => "EOF",
        };
        f.write_str(symbol)
    }
}
